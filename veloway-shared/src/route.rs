use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, GeoPoint};

/// A named pickup or drop location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub point: GeoPoint,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            point: GeoPoint::new(lat, lng),
        }
    }
}

/// An origin/destination pair. Stored as an immutable snapshot on bookings,
/// which may cover only a sub-segment of the offer's own route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub from: Place,
    pub to: Place,
}

impl Route {
    pub fn new(from: Place, to: Place) -> Self {
        Self { from, to }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.from.point, self.to.point)
    }
}
