use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use veloway_booking::{Booking, BookingRepository, LedgerBalances, LedgerRepository};
use veloway_core::{CoreError, CoreResult};
use veloway_offer::{Offer, OfferRepository, OfferStatus, TimeSlot};
use veloway_shared::round2;

/// In-memory offer store. The write lock is the per-offer critical section
/// the repository contract requires: the domain's check-then-mutate runs
/// entirely inside one lock hold, so concurrent requests for the last seat
/// or an overlapping slot resolve to one winner and one conflict.
pub struct MemoryOffers {
    inner: RwLock<HashMap<Uuid, Offer>>,
}

impl MemoryOffers {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn mutate<T>(
        &self,
        offer_id: Uuid,
        apply: impl FnOnce(&mut Offer) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut offers = self.inner.write();
        let offer = offers
            .get_mut(&offer_id)
            .ok_or_else(|| CoreError::not_found(format!("offer {offer_id}")))?;
        apply(offer)
    }
}

impl Default for MemoryOffers {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OfferRepository for MemoryOffers {
    async fn insert(&self, offer: Offer) -> CoreResult<()> {
        let mut offers = self.inner.write();
        if offers.contains_key(&offer.id) {
            return Err(CoreError::conflict("offer already exists"));
        }
        offers.insert(offer.id, offer);
        Ok(())
    }

    async fn get(&self, offer_id: Uuid) -> CoreResult<Offer> {
        self.inner
            .read()
            .get(&offer_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("offer {offer_id}")))
    }

    async fn reserve_seat(&self, offer_id: Uuid, rider_id: Uuid) -> CoreResult<Offer> {
        self.mutate(offer_id, |offer| {
            offer.reserve_seat(rider_id)?;
            Ok(offer.clone())
        })
    }

    async fn release_seat(&self, offer_id: Uuid, rider_id: Uuid) -> CoreResult<Offer> {
        self.mutate(offer_id, |offer| {
            offer.release_seat(rider_id)?;
            Ok(offer.clone())
        })
    }

    async fn reserve_time_slot(
        &self,
        offer_id: Uuid,
        rider_id: Uuid,
        booking_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> CoreResult<Offer> {
        self.mutate(offer_id, |offer| {
            offer.reserve_slot(booking_id, date, slot)?;
            offer.register_rental_booking(rider_id)?;
            Ok(offer.clone())
        })
    }

    async fn register_rental_booking(&self, offer_id: Uuid, rider_id: Uuid) -> CoreResult<Offer> {
        self.mutate(offer_id, |offer| {
            offer.register_rental_booking(rider_id)?;
            Ok(offer.clone())
        })
    }

    async fn release_time_slot(
        &self,
        offer_id: Uuid,
        rider_id: Uuid,
        booking_id: Uuid,
    ) -> CoreResult<Offer> {
        self.mutate(offer_id, |offer| {
            offer.release_slot(rider_id, booking_id)?;
            Ok(offer.clone())
        })
    }

    async fn set_status(&self, offer_id: Uuid, status: OfferStatus) -> CoreResult<()> {
        self.mutate(offer_id, |offer| {
            offer.status = status;
            offer.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn record_view(&self, offer_id: Uuid) -> CoreResult<()> {
        self.mutate(offer_id, |offer| {
            offer.view_count += 1;
            Ok(())
        })
    }

    async fn list_by_status(&self, statuses: &[OfferStatus]) -> CoreResult<Vec<Offer>> {
        Ok(self
            .inner
            .read()
            .values()
            .filter(|offer| statuses.contains(&offer.status))
            .cloned()
            .collect())
    }
}

pub struct MemoryBookings {
    inner: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookings {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBookings {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookings {
    async fn insert(&self, booking: Booking) -> CoreResult<()> {
        let mut bookings = self.inner.write();
        if bookings.contains_key(&booking.id) {
            return Err(CoreError::conflict("booking already exists"));
        }
        bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn get(&self, booking_id: Uuid) -> CoreResult<Booking> {
        self.inner
            .read()
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("booking {booking_id}")))
    }

    async fn update(&self, booking: Booking) -> CoreResult<()> {
        let mut bookings = self.inner.write();
        if !bookings.contains_key(&booking.id) {
            return Err(CoreError::not_found(format!("booking {}", booking.id)));
        }
        bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn list_for_offer(&self, offer_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(self
            .inner
            .read()
            .values()
            .filter(|booking| booking.offer_id == offer_id)
            .cloned()
            .collect())
    }

    async fn find_active_for_rider(
        &self,
        offer_id: Uuid,
        rider_id: Uuid,
    ) -> CoreResult<Option<Booking>> {
        Ok(self
            .inner
            .read()
            .values()
            .find(|booking| {
                booking.offer_id == offer_id
                    && booking.rider_id == rider_id
                    && !booking.is_terminal()
            })
            .cloned())
    }
}

/// Per-user ledger counters. Increments and the clamped decrement run under
/// the write lock, so concurrent mutations on the same user never lose an
/// update; entries materialize at zero on first touch.
pub struct MemoryLedger {
    inner: RwLock<HashMap<Uuid, LedgerBalances>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_non_negative(amount: f64) -> CoreResult<()> {
    if amount < 0.0 {
        return Err(CoreError::validation("ledger amounts must be non-negative"));
    }
    Ok(())
}

#[async_trait]
impl LedgerRepository for MemoryLedger {
    async fn balances(&self, user_id: Uuid) -> CoreResult<LedgerBalances> {
        Ok(self.inner.read().get(&user_id).copied().unwrap_or_default())
    }

    async fn increment_inflow(&self, user_id: Uuid, amount: f64) -> CoreResult<()> {
        ensure_non_negative(amount)?;
        let mut ledger = self.inner.write();
        let balances = ledger.entry(user_id).or_default();
        balances.inflow = round2(balances.inflow + amount);
        Ok(())
    }

    async fn increment_outflow(&self, user_id: Uuid, amount: f64) -> CoreResult<()> {
        ensure_non_negative(amount)?;
        let mut ledger = self.inner.write();
        let balances = ledger.entry(user_id).or_default();
        balances.outflow = round2(balances.outflow + amount);
        Ok(())
    }

    async fn decrement_outflow(&self, user_id: Uuid, amount: f64) -> CoreResult<f64> {
        ensure_non_negative(amount)?;
        let mut ledger = self.inner.write();
        let balances = ledger.entry(user_id).or_default();
        let applied = amount.min(balances.outflow);
        balances.outflow = round2(balances.outflow - applied);
        Ok(round2(applied))
    }
}
