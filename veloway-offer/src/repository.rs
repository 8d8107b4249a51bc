use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use veloway_core::CoreResult;

use crate::models::{Offer, OfferStatus};
use crate::slots::TimeSlot;

/// Storage contract for offers. Every mutating operation is an atomic
/// conditional update on the offer document: the implementation must run the
/// check-then-mutate inside a per-offer critical section, so concurrent
/// requests for the last seat or an overlapping slot produce exactly one
/// winner and one conflict.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert(&self, offer: Offer) -> CoreResult<()>;

    async fn get(&self, offer_id: Uuid) -> CoreResult<Offer>;

    /// Atomically take one seat and commit the rider. Returns the updated
    /// offer snapshot.
    async fn reserve_seat(&self, offer_id: Uuid, rider_id: Uuid) -> CoreResult<Offer>;

    /// Atomically give a seat back and remove the rider.
    async fn release_seat(&self, offer_id: Uuid, rider_id: Uuid) -> CoreResult<Offer>;

    /// Atomically commit a rental interval plus the booking bookkeeping
    /// (participant, counters, first-booking activation).
    async fn reserve_time_slot(
        &self,
        offer_id: Uuid,
        rider_id: Uuid,
        booking_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> CoreResult<Offer>;

    /// Register a rental booking that did not pin a concrete interval
    /// (duration-only bookings).
    async fn register_rental_booking(&self, offer_id: Uuid, rider_id: Uuid) -> CoreResult<Offer>;

    /// Atomically drop a slot hold (when present) and count the cancellation.
    async fn release_time_slot(
        &self,
        offer_id: Uuid,
        rider_id: Uuid,
        booking_id: Uuid,
    ) -> CoreResult<Offer>;

    async fn set_status(&self, offer_id: Uuid, status: OfferStatus) -> CoreResult<()>;

    async fn record_view(&self, offer_id: Uuid) -> CoreResult<()>;

    async fn list_by_status(&self, statuses: &[OfferStatus]) -> CoreResult<Vec<Offer>>;
}
