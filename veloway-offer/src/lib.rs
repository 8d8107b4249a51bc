pub mod models;
pub mod repository;
pub mod slots;

pub use models::{
    Offer, OfferDetails, OfferStatus, OperatorRole, PoolingDetails, RentalDetails, ServiceKind,
    SlotHold, TripOperator, Vehicle, VehicleType,
};
pub use repository::OfferRepository;
pub use slots::TimeSlot;
