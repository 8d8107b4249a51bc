use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use veloway_core::CoreResult;

use crate::models::Booking;

/// Storage contract for bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> CoreResult<()>;

    async fn get(&self, booking_id: Uuid) -> CoreResult<Booking>;

    async fn update(&self, booking: Booking) -> CoreResult<()>;

    async fn list_for_offer(&self, offer_id: Uuid) -> CoreResult<Vec<Booking>>;

    /// The rider's non-terminal (pending/confirmed/in-progress) booking on
    /// the offer, if any. Backs the duplicate-booking guard.
    async fn find_active_for_rider(
        &self,
        offer_id: Uuid,
        rider_id: Uuid,
    ) -> CoreResult<Option<Booking>>;
}

/// Per-user running balances. `inflow` is what the platform owes the
/// operator from online payments; `outflow` is what the operator owes the
/// platform from cash collected. Both stay non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerBalances {
    pub inflow: f64,
    pub outflow: f64,
}

/// Storage contract for the per-user settlement ledger. Every mutation is an
/// atomic counter operation: implementations must never read-modify-write a
/// stale snapshot, and concurrent mutations on the same user lose nothing.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn balances(&self, user_id: Uuid) -> CoreResult<LedgerBalances>;

    async fn increment_inflow(&self, user_id: Uuid, amount: f64) -> CoreResult<()>;

    async fn increment_outflow(&self, user_id: Uuid, amount: f64) -> CoreResult<()>;

    /// Reduce the user's outflow by at most `amount`, clamped at zero.
    /// Returns the amount actually applied.
    async fn decrement_outflow(&self, user_id: Uuid, amount: f64) -> CoreResult<f64>;
}
