use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use veloway_core::{CoreError, CoreResult};
use veloway_shared::{Place, Route};

use crate::slots::TimeSlot;

/// Offer status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Pending,
    Active,
    Booked,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    Pooling,
    Rental,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Pooling => "pooling",
            ServiceKind::Rental => "rental",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Car,
    Bike,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorRole {
    Driver,
    Owner,
}

/// The counterpart to the rider on every offer and booking, whether a
/// pooling driver or a rental vehicle owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripOperator {
    pub user_id: Uuid,
    pub role: OperatorRole,
    pub name: String,
}

impl TripOperator {
    pub fn driver(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role: OperatorRole::Driver,
            name: name.into(),
        }
    }

    pub fn owner(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role: OperatorRole::Owner,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_type: VehicleType,
    pub model: String,
    pub plate: String,
}

/// Seat inventory for a pooling trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolingDetails {
    pub route: Route,
    pub departure: NaiveTime,
    pub total_seats: u32,
    pub available_seats: u32,
}

/// A committed rental interval on an offer's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotHold {
    pub booking_id: Uuid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
}

/// Time-window availability for an hourly rental listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalDetails {
    pub pickup: Place,
    pub hourly_rate: f64,
    pub window: TimeSlot,
    pub minimum_hours: u32,
    pub holds: Vec<SlotHold>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDetails {
    Pooling(PoolingDetails),
    Rental(RentalDetails),
}

/// A driver's pooling trip or an owner's rental listing, with finite
/// capacity (seats or time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub operator: TripOperator,
    pub date: NaiveDate,
    pub vehicle: Vehicle,
    pub details: OfferDetails,
    pub status: OfferStatus,
    pub participants: Vec<Uuid>,
    pub booking_count: u32,
    pub view_count: u32,
    pub cancellation_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn new_pooling(
        operator: TripOperator,
        date: NaiveDate,
        vehicle: Vehicle,
        route: Route,
        departure: NaiveTime,
        total_seats: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            operator,
            date,
            vehicle,
            details: OfferDetails::Pooling(PoolingDetails {
                route,
                departure,
                total_seats,
                available_seats: total_seats,
            }),
            status: OfferStatus::Pending,
            participants: Vec::new(),
            booking_count: 0,
            view_count: 0,
            cancellation_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_rental(
        operator: TripOperator,
        date: NaiveDate,
        vehicle: Vehicle,
        pickup: Place,
        hourly_rate: f64,
        window: TimeSlot,
        minimum_hours: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            operator,
            date,
            vehicle,
            details: OfferDetails::Rental(RentalDetails {
                pickup,
                hourly_rate,
                window,
                minimum_hours,
                holds: Vec::new(),
            }),
            status: OfferStatus::Pending,
            participants: Vec::new(),
            booking_count: 0,
            view_count: 0,
            cancellation_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        match self.details {
            OfferDetails::Pooling(_) => ServiceKind::Pooling,
            OfferDetails::Rental(_) => ServiceKind::Rental,
        }
    }

    /// Open for new bookings. Booked, completed and cancelled offers are not.
    pub fn is_bookable(&self) -> bool {
        matches!(self.status, OfferStatus::Pending | OfferStatus::Active)
    }

    pub fn pooling(&self) -> Option<&PoolingDetails> {
        match &self.details {
            OfferDetails::Pooling(details) => Some(details),
            OfferDetails::Rental(_) => None,
        }
    }

    pub fn rental(&self) -> Option<&RentalDetails> {
        match &self.details {
            OfferDetails::Rental(details) => Some(details),
            OfferDetails::Pooling(_) => None,
        }
    }

    /// Scheduled departure for a pooling trip, on the offer's date.
    pub fn scheduled_departure(&self) -> Option<NaiveDateTime> {
        self.pooling().map(|details| self.date.and_time(details.departure))
    }

    pub fn route(&self) -> Option<&Route> {
        self.pooling().map(|details| &details.route)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Take one seat for the rider. Pure check-then-mutate: the repository
    /// runs this inside the offer's critical section so the last seat has
    /// exactly one winner.
    pub fn reserve_seat(&mut self, rider_id: Uuid) -> CoreResult<()> {
        if !self.is_bookable() {
            return Err(CoreError::conflict("offer is not open for booking"));
        }
        let details = match &mut self.details {
            OfferDetails::Pooling(details) => details,
            OfferDetails::Rental(_) => {
                return Err(CoreError::conflict("offer is not a pooling trip"))
            }
        };
        if details.available_seats == 0 {
            return Err(CoreError::conflict("no seats available"));
        }
        details.available_seats -= 1;
        self.status = if details.available_seats == 0 {
            OfferStatus::Booked
        } else {
            OfferStatus::Active
        };
        self.participants.push(rider_id);
        self.booking_count += 1;
        self.touch();
        Ok(())
    }

    /// Give a seat back after a cancellation. Never regresses a Booked or
    /// Active offer back to Pending.
    pub fn release_seat(&mut self, rider_id: Uuid) -> CoreResult<()> {
        let details = match &mut self.details {
            OfferDetails::Pooling(details) => details,
            OfferDetails::Rental(_) => {
                return Err(CoreError::conflict("offer is not a pooling trip"))
            }
        };
        if details.available_seats < details.total_seats {
            details.available_seats += 1;
        }
        if let Some(position) = self.participants.iter().position(|p| *p == rider_id) {
            self.participants.remove(position);
        }
        self.touch();
        Ok(())
    }

    /// Commit a rental interval. Fails when the interval leaves the
    /// availability window or collides with an existing hold on the date.
    pub fn reserve_slot(&mut self, booking_id: Uuid, date: NaiveDate, slot: TimeSlot) -> CoreResult<()> {
        let details = match &mut self.details {
            OfferDetails::Rental(details) => details,
            OfferDetails::Pooling(_) => {
                return Err(CoreError::conflict("offer is not a rental listing"))
            }
        };
        if !slot.within(&details.window) {
            return Err(CoreError::conflict(
                "requested slot is outside the availability window",
            ));
        }
        if details
            .holds
            .iter()
            .any(|hold| hold.date == date && hold.slot.overlaps(&slot))
        {
            return Err(CoreError::conflict("requested slot overlaps an existing booking"));
        }
        details.holds.push(SlotHold {
            booking_id,
            date,
            slot,
        });
        self.touch();
        Ok(())
    }

    /// Record a new rental booking: counters, participant list and the
    /// pending-to-active flip on the first booking.
    pub fn register_rental_booking(&mut self, rider_id: Uuid) -> CoreResult<()> {
        if self.rental().is_none() {
            return Err(CoreError::conflict("offer is not a rental listing"));
        }
        if !self.is_bookable() {
            return Err(CoreError::conflict("offer is not open for booking"));
        }
        if self.status == OfferStatus::Pending {
            self.status = OfferStatus::Active;
        }
        self.participants.push(rider_id);
        self.booking_count += 1;
        self.touch();
        Ok(())
    }

    /// Undo a rental booking on cancellation: drop the slot hold if one was
    /// committed and bump the cancellation counter.
    pub fn release_slot(&mut self, rider_id: Uuid, booking_id: Uuid) -> CoreResult<()> {
        let details = match &mut self.details {
            OfferDetails::Rental(details) => details,
            OfferDetails::Pooling(_) => {
                return Err(CoreError::conflict("offer is not a rental listing"))
            }
        };
        details.holds.retain(|hold| hold.booking_id != booking_id);
        if let Some(position) = self.participants.iter().position(|p| *p == rider_id) {
            self.participants.remove(position);
        }
        self.cancellation_count += 1;
        self.touch();
        Ok(())
    }
}
