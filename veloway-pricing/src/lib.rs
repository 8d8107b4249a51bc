pub mod engine;

pub use engine::{Fare, FareBreakdown, FareStage, PricingEngine, RateCard, SupplyLevel};
