use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use veloway_core::{CoreError, CoreResult};
use veloway_offer::{OfferRepository, OfferStatus};

use crate::models::{Booking, BookingStatus, PassengerStatus};
use crate::repository::BookingRepository;
use crate::settlement::SettlementLedger;

/// Trips may start this many minutes ahead of the scheduled departure.
pub const START_GRACE_MINUTES: i64 = 5;

/// Advances bookings through the trip lifecycle and runs the code-verified
/// drop-off protocol.
#[derive(Clone)]
pub struct TripService {
    offers: Arc<dyn OfferRepository>,
    bookings: Arc<dyn BookingRepository>,
    settlement: SettlementLedger,
}

impl TripService {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        bookings: Arc<dyn BookingRepository>,
        settlement: SettlementLedger,
    ) -> Self {
        Self {
            offers,
            bookings,
            settlement,
        }
    }

    /// Driver confirms the passenger boarded.
    pub async fn mark_got_in(&self, booking_id: Uuid, operator_id: Uuid) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        ensure_operator(&booking, operator_id)?;
        match booking.passenger_status {
            Some(PassengerStatus::Waiting) => {}
            Some(_) => return Err(CoreError::conflict("passenger is not waiting to board")),
            None => return Err(CoreError::conflict("rental bookings have no boarding status")),
        }
        booking.passenger_status = Some(PassengerStatus::GotIn);
        booking.touch();
        self.bookings.update(booking.clone()).await?;
        Ok(booking)
    }

    /// Passenger leaves the vehicle: issue a fresh one-time drop-off code
    /// that the operator must read back to complete the trip.
    pub async fn mark_got_out(&self, booking_id: Uuid) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        if booking.passenger_status != Some(PassengerStatus::GotIn) {
            return Err(CoreError::conflict("passenger has not boarded"));
        }
        booking.passenger_status = Some(PassengerStatus::GotOut);
        booking.passenger_code = Some(generate_code());
        booking.code_generated_at = Some(Utc::now());
        booking.touch();
        self.bookings.update(booking.clone()).await?;
        Ok(booking)
    }

    /// Complete a single passenger's trip against the drop-off code. The
    /// supplied code must equal the generated one, no wildcard matches.
    /// Once every non-cancelled booking under the offer is completed, the
    /// offer itself completes.
    pub async fn verify_code_and_complete(
        &self,
        booking_id: Uuid,
        operator_id: Uuid,
        supplied_code: &str,
    ) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        ensure_operator(&booking, operator_id)?;
        if booking.is_terminal() {
            return Err(CoreError::conflict("booking is already completed or cancelled"));
        }
        if booking.passenger_status != Some(PassengerStatus::GotOut) {
            return Err(CoreError::conflict("passenger has not been dropped off"));
        }
        let expected = booking
            .passenger_code
            .as_deref()
            .ok_or_else(|| CoreError::conflict("no verification code was issued"))?;
        if supplied_code != expected {
            return Err(CoreError::conflict("verification code mismatch"));
        }

        booking.complete_trip(Utc::now());
        self.settlement.settle_completed(&mut booking).await?;
        self.bookings.update(booking.clone()).await?;
        info!(booking_id = %booking.id, "trip completed for passenger");

        self.complete_offer_if_done(booking.offer_id).await?;
        Ok(booking)
    }

    /// Manually start a pooling trip, advancing every eligible booking with
    /// one shared start time. Allowed from 5 minutes before the scheduled
    /// departure; already-running trips are a no-op.
    pub async fn start_trip(&self, offer_id: Uuid, operator_id: Uuid) -> CoreResult<usize> {
        self.start_trip_at(offer_id, operator_id, Utc::now()).await
    }

    pub async fn start_trip_at(
        &self,
        offer_id: Uuid,
        operator_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<usize> {
        let offer = self.offers.get(offer_id).await?;
        if offer.operator.user_id != operator_id {
            return Err(CoreError::conflict("only the trip operator may start the trip"));
        }
        let scheduled = offer
            .scheduled_departure()
            .ok_or_else(|| CoreError::conflict("rental trips start per booking, not per offer"))?;
        let earliest = scheduled - Duration::minutes(START_GRACE_MINUTES);
        if now.naive_utc() < earliest {
            let wait = earliest - now.naive_utc();
            return Err(CoreError::conflict(format!(
                "trip cannot start yet, about {} minute(s) to go",
                wait.num_minutes().max(1)
            )));
        }
        let advanced =
            advance_eligible_bookings(self.bookings.as_ref(), offer_id, now, false).await?;
        if advanced > 0 {
            info!(offer_id = %offer_id, bookings = advanced, "trip started");
        }
        Ok(advanced)
    }

    /// End the whole trip: every non-terminal booking goes straight to
    /// completed with settlement, then the offer completes. Used for rentals
    /// and whole-trip pooling ends.
    pub async fn end_trip(&self, offer_id: Uuid, operator_id: Uuid) -> CoreResult<usize> {
        let offer = self.offers.get(offer_id).await?;
        if offer.operator.user_id != operator_id {
            return Err(CoreError::conflict("only the trip operator may end the trip"));
        }
        let now = Utc::now();
        let mut completed = 0;
        for mut booking in self.bookings.list_for_offer(offer_id).await? {
            if booking.is_terminal() {
                continue;
            }
            booking.complete_trip(now);
            self.settlement.settle_completed(&mut booking).await?;
            self.bookings.update(booking).await?;
            completed += 1;
        }
        self.offers.set_status(offer_id, OfferStatus::Completed).await?;
        info!(offer_id = %offer_id, bookings = completed, "trip ended");
        Ok(completed)
    }

    async fn complete_offer_if_done(&self, offer_id: Uuid) -> CoreResult<()> {
        let bookings = self.bookings.list_for_offer(offer_id).await?;
        let any_completed = bookings
            .iter()
            .any(|b| b.status == BookingStatus::Completed);
        let all_done = bookings
            .iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .all(|b| b.status == BookingStatus::Completed);
        if any_completed && all_done {
            self.offers.set_status(offer_id, OfferStatus::Completed).await?;
            info!(offer_id = %offer_id, "all passengers dropped, offer completed");
        }
        Ok(())
    }
}

fn ensure_operator(booking: &Booking, actor_id: Uuid) -> CoreResult<()> {
    if booking.operator.user_id != actor_id {
        return Err(CoreError::conflict(
            "only the trip operator may perform this action",
        ));
    }
    Ok(())
}

pub(crate) fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..10000).to_string()
}

/// Move every pending/confirmed booking under the offer to in-progress with
/// a shared start time. Bookings already running (or finished, or cancelled)
/// are skipped, which makes both the manual start and the scheduler's
/// unattended start idempotent. `issue_codes` pre-generates drop-off codes
/// for unattended starts.
pub(crate) async fn advance_eligible_bookings(
    bookings: &dyn BookingRepository,
    offer_id: Uuid,
    now: DateTime<Utc>,
    issue_codes: bool,
) -> CoreResult<usize> {
    let mut advanced = 0;
    for mut booking in bookings.list_for_offer(offer_id).await? {
        match booking.status {
            BookingStatus::Pending | BookingStatus::Confirmed => {}
            _ => continue,
        }
        booking.begin_trip(now);
        if issue_codes && booking.passenger_code.is_none() {
            booking.passenger_code = Some(generate_code());
            booking.code_generated_at = Some(now);
        }
        bookings.update(booking).await?;
        advanced += 1;
    }
    Ok(advanced)
}
