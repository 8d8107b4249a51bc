use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use veloway_offer::{ServiceKind, TimeSlot, TripOperator, Vehicle};
use veloway_pricing::{Fare, FareBreakdown};
use veloway_shared::Route;

/// Booking status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Boarding sub-status, orthogonal to the booking status. Pooling only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassengerStatus {
    Waiting,
    GotIn,
    GotOut,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Online,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    /// Trip not completed yet, nothing to settle.
    Unsettled,
    /// Cash trip settled on the spot; the fee debt sits on the ledger.
    Pending,
    /// Operator payout awaiting admin action.
    Requested,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_by: Uuid,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// When the trip happens: a pooling departure time, or a rental interval
/// (the concrete slot is absent for duration-only rentals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Schedule {
    Pooling { departure: NaiveTime },
    Rental { slot: Option<TimeSlot>, duration_hours: f64 },
}

/// A rider's commitment against exactly one offer, carrying a frozen price
/// and its own trip/settlement state. `total_amount == amount + platform_fee`
/// holds from creation; the three amounts never change after the booking is
/// completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub offer_id: Uuid,
    pub service: ServiceKind,
    pub route: Option<Route>,
    pub date: NaiveDate,
    pub schedule: Schedule,
    pub operator: TripOperator,
    pub vehicle: Vehicle,
    pub amount: f64,
    pub platform_fee: f64,
    pub total_amount: f64,
    pub fare_breakdown: Option<FareBreakdown>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub passenger_status: Option<PassengerStatus>,
    pub passenger_code: Option<String>,
    pub code_generated_at: Option<DateTime<Utc>>,
    pub settlement_status: SettlementStatus,
    pub settlement_amount: Option<f64>,
    pub settlement_requested_at: Option<DateTime<Utc>>,
    pub settlement_resolved_at: Option<DateTime<Utc>>,
    pub settlement_note: Option<String>,
    pub cancellation: Option<Cancellation>,
    pub trip_started_at: Option<DateTime<Utc>>,
    pub trip_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new_pooling(
        rider_id: Uuid,
        offer_id: Uuid,
        operator: TripOperator,
        vehicle: Vehicle,
        date: NaiveDate,
        departure: NaiveTime,
        route: Route,
        fare: Fare,
        fare_breakdown: Option<FareBreakdown>,
        payment_method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            rider_id,
            offer_id,
            service: ServiceKind::Pooling,
            route: Some(route),
            date,
            schedule: Schedule::Pooling { departure },
            operator,
            vehicle,
            amount: fare.amount,
            platform_fee: fare.platform_fee,
            total_amount: fare.total_amount,
            fare_breakdown,
            payment_method,
            payment_status: PaymentStatus::Pending,
            status: BookingStatus::Pending,
            passenger_status: Some(PassengerStatus::Waiting),
            passenger_code: None,
            code_generated_at: None,
            settlement_status: SettlementStatus::Unsettled,
            settlement_amount: None,
            settlement_requested_at: None,
            settlement_resolved_at: None,
            settlement_note: None,
            cancellation: None,
            trip_started_at: None,
            trip_completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_rental(
        rider_id: Uuid,
        offer_id: Uuid,
        operator: TripOperator,
        vehicle: Vehicle,
        date: NaiveDate,
        slot: Option<TimeSlot>,
        duration_hours: f64,
        fare: Fare,
        payment_method: PaymentMethod,
        status: BookingStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            rider_id,
            offer_id,
            service: ServiceKind::Rental,
            route: None,
            date,
            schedule: Schedule::Rental {
                slot,
                duration_hours,
            },
            operator,
            vehicle,
            amount: fare.amount,
            platform_fee: fare.platform_fee,
            total_amount: fare.total_amount,
            fare_breakdown: None,
            payment_method,
            payment_status: PaymentStatus::Pending,
            status,
            passenger_status: None,
            passenger_code: None,
            code_generated_at: None,
            settlement_status: SettlementStatus::Unsettled,
            settlement_amount: None,
            settlement_requested_at: None,
            settlement_resolved_at: None,
            settlement_note: None,
            cancellation: None,
            trip_started_at: None,
            trip_completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_cancelled(&mut self, cancelled_by: Uuid, reason: &str) {
        self.status = BookingStatus::Cancelled;
        self.cancellation = Some(Cancellation {
            cancelled_by,
            reason: reason.to_string(),
            cancelled_at: Utc::now(),
        });
        self.touch();
    }

    pub(crate) fn begin_trip(&mut self, at: DateTime<Utc>) {
        self.status = BookingStatus::InProgress;
        self.trip_started_at = Some(at);
        self.touch();
    }

    pub(crate) fn complete_trip(&mut self, at: DateTime<Utc>) {
        self.status = BookingStatus::Completed;
        self.trip_completed_at = Some(at);
        self.touch();
    }
}
