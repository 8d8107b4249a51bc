pub mod geo;
pub mod money;
pub mod route;

pub use geo::{haversine_km, BoundingBox, GeoPoint};
pub use money::round2;
pub use route::{Place, Route};
