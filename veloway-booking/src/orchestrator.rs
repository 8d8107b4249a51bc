use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use veloway_core::conversation::ConversationService;
use veloway_core::payment::{PaymentAuthority, PaymentOrder};
use veloway_core::{CoreError, CoreResult};
use veloway_offer::{OfferRepository, OfferStatus, ServiceKind, TimeSlot};
use veloway_pricing::{FareBreakdown, PricingEngine};
use veloway_shared::Route;

use crate::models::{Booking, BookingStatus, PaymentMethod, PaymentStatus};
use crate::repository::BookingRepository;
use crate::settlement::SettlementLedger;

#[derive(Debug, Clone)]
pub struct PoolingBookingRequest {
    pub rider_id: Uuid,
    pub offer_id: Uuid,
    pub payment_method: PaymentMethod,
    /// The rider's own segment; may be a sub-segment of the offer's route
    /// for mid-route boarding.
    pub route: Route,
    /// A quote the client already fetched. When present its amounts are
    /// frozen onto the booking as-is.
    pub quote: Option<FareBreakdown>,
}

#[derive(Debug, Clone)]
pub struct RentalBookingRequest {
    pub rider_id: Uuid,
    pub offer_id: Uuid,
    pub payment_method: PaymentMethod,
    /// Either this or the start/end pair must be given.
    pub duration_hours: Option<f64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Creates and cancels bookings, freezing prices and keeping the offer's
/// seat/slot inventory consistent with the bookings that exist.
#[derive(Clone)]
pub struct BookingOrchestrator {
    offers: Arc<dyn OfferRepository>,
    bookings: Arc<dyn BookingRepository>,
    pricing: PricingEngine,
    conversations: Arc<dyn ConversationService>,
    payments: Arc<dyn PaymentAuthority>,
    settlement: SettlementLedger,
}

impl BookingOrchestrator {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        bookings: Arc<dyn BookingRepository>,
        pricing: PricingEngine,
        conversations: Arc<dyn ConversationService>,
        payments: Arc<dyn PaymentAuthority>,
        settlement: SettlementLedger,
    ) -> Self {
        Self {
            offers,
            bookings,
            pricing,
            conversations,
            payments,
            settlement,
        }
    }

    pub async fn create_pooling_booking(
        &self,
        request: PoolingBookingRequest,
    ) -> CoreResult<Booking> {
        let offer = self.offers.get(request.offer_id).await?;
        let details = offer
            .pooling()
            .ok_or_else(|| CoreError::conflict("offer is not a pooling trip"))?;
        if !offer.is_bookable() || details.available_seats == 0 {
            return Err(CoreError::conflict("offer has no seats left"));
        }
        if self
            .bookings
            .find_active_for_rider(offer.id, request.rider_id)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(
                "rider already holds a booking on this offer",
            ));
        }

        let breakdown = match request.quote {
            Some(quote) => quote,
            None => {
                let competing = self
                    .offers
                    .list_by_status(&[OfferStatus::Pending, OfferStatus::Active, OfferStatus::Booked])
                    .await?;
                self.pricing.quote(
                    &request.route,
                    offer.vehicle.vehicle_type,
                    details.departure,
                    &competing,
                    Some(offer.id),
                )
            }
        };

        let booking = Booking::new_pooling(
            request.rider_id,
            offer.id,
            offer.operator.clone(),
            offer.vehicle.clone(),
            offer.date,
            details.departure,
            request.route,
            breakdown.fare(),
            Some(breakdown),
            request.payment_method,
        );

        // The winner of the last seat is decided here, atomically.
        self.offers.reserve_seat(offer.id, request.rider_id).await?;
        self.bookings.insert(booking.clone()).await?;
        info!(
            booking_id = %booking.id,
            offer_id = %offer.id,
            total = booking.total_amount,
            "pooling booking created"
        );

        self.spawn_conversation(&booking).await;
        Ok(booking)
    }

    pub async fn create_rental_booking(
        &self,
        request: RentalBookingRequest,
    ) -> CoreResult<Booking> {
        // Validate the whole request before touching any state.
        let slot = match (&request.start_time, &request.end_time) {
            (Some(start), Some(end)) => Some(TimeSlot::parse(start, end)?),
            (None, None) => None,
            _ => {
                return Err(CoreError::validation(
                    "start and end times must be given together",
                ))
            }
        };
        let duration_hours = match (slot, request.duration_hours) {
            (Some(slot), _) => slot.duration_hours(),
            (None, Some(hours)) => hours,
            (None, None) => {
                return Err(CoreError::validation(
                    "either a duration or a start/end pair is required",
                ))
            }
        };
        if duration_hours <= 0.0 {
            return Err(CoreError::validation("duration must be positive"));
        }

        let offer = self.offers.get(request.offer_id).await?;
        let rental = offer
            .rental()
            .ok_or_else(|| CoreError::conflict("offer is not a rental listing"))?;
        if !offer.is_bookable() {
            return Err(CoreError::conflict("offer is not open for booking"));
        }
        if duration_hours < f64::from(rental.minimum_hours) {
            return Err(CoreError::validation(format!(
                "duration is below the {} hour minimum",
                rental.minimum_hours
            )));
        }

        let fare = self.pricing.rental_fare(rental.hourly_rate, duration_hours);
        // Cash rentals settle at trip end, so the booking is confirmed
        // outright; online ones stay pending until payment verification.
        let status = match request.payment_method {
            PaymentMethod::Cash => BookingStatus::Confirmed,
            PaymentMethod::Online => BookingStatus::Pending,
        };
        let booking = Booking::new_rental(
            request.rider_id,
            offer.id,
            offer.operator.clone(),
            offer.vehicle.clone(),
            offer.date,
            slot,
            duration_hours,
            fare,
            request.payment_method,
            status,
        );

        match slot {
            Some(slot) => {
                self.offers
                    .reserve_time_slot(offer.id, request.rider_id, booking.id, offer.date, slot)
                    .await?;
            }
            None => {
                self.offers
                    .register_rental_booking(offer.id, request.rider_id)
                    .await?;
            }
        }
        self.bookings.insert(booking.clone()).await?;
        info!(
            booking_id = %booking.id,
            offer_id = %offer.id,
            hours = duration_hours,
            "rental booking created"
        );

        self.spawn_conversation(&booking).await;
        Ok(booking)
    }

    /// Cancel a booking and hand its seat or slot back to the offer.
    /// Terminal bookings cannot be cancelled.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        if booking.is_terminal() {
            return Err(CoreError::conflict(
                "booking is already completed or cancelled",
            ));
        }
        booking.mark_cancelled(actor_id, reason);
        self.bookings.update(booking.clone()).await?;

        match booking.service {
            ServiceKind::Pooling => {
                self.offers
                    .release_seat(booking.offer_id, booking.rider_id)
                    .await?;
            }
            ServiceKind::Rental => {
                self.offers
                    .release_time_slot(booking.offer_id, booking.rider_id, booking.id)
                    .await?;
            }
        }
        info!(booking_id = %booking.id, actor_id = %actor_id, "booking cancelled");
        Ok(booking)
    }

    /// Operator-driven status change. Re-requesting the current status is a
    /// no-op success; only forward transitions are legal.
    pub async fn update_booking_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
        actor_id: Uuid,
    ) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        if booking.operator.user_id != actor_id {
            return Err(CoreError::conflict(
                "only the trip operator may update trip status",
            ));
        }
        if booking.status == new_status {
            return Ok(booking);
        }
        match (booking.status, new_status) {
            (BookingStatus::Pending | BookingStatus::Confirmed, BookingStatus::InProgress) => {
                booking.begin_trip(Utc::now());
            }
            (BookingStatus::InProgress, BookingStatus::Completed) => {
                booking.complete_trip(Utc::now());
                self.settlement.settle_completed(&mut booking).await?;
            }
            (from, to) => {
                return Err(CoreError::conflict(format!(
                    "illegal transition {} -> {}",
                    from.as_str(),
                    to.as_str()
                )))
            }
        }
        self.bookings.update(booking.clone()).await?;
        Ok(booking)
    }

    /// Register an order for the booking's total with the payment authority.
    pub async fn create_payment_order(&self, booking_id: Uuid) -> CoreResult<PaymentOrder> {
        let booking = self.bookings.get(booking_id).await?;
        if booking.payment_method == PaymentMethod::Cash {
            return Err(CoreError::conflict("cash bookings have no online order"));
        }
        self.payments
            .create_order(booking.id, booking.total_amount)
            .await
    }

    /// React to the payment authority's verdict on an online payment. Only a
    /// verified result mutates the booking: payment goes paid and a pending
    /// booking is confirmed.
    pub async fn confirm_online_payment(
        &self,
        booking_id: Uuid,
        order_id: &str,
        signature: &str,
    ) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        if booking.payment_method != PaymentMethod::Online {
            return Err(CoreError::conflict("booking is not paid online"));
        }
        if booking.payment_status == PaymentStatus::Paid {
            return Ok(booking);
        }
        let verified = self.payments.verify_payment(order_id, signature).await?;
        if !verified {
            return Err(CoreError::conflict("payment could not be verified"));
        }
        booking.payment_status = PaymentStatus::Paid;
        if booking.status == BookingStatus::Pending {
            booking.status = BookingStatus::Confirmed;
        }
        booking.touch();
        self.bookings.update(booking.clone()).await?;
        info!(booking_id = %booking.id, order_id, "online payment confirmed");
        Ok(booking)
    }

    /// Chat creation is best-effort: log and move on, the booking stands.
    async fn spawn_conversation(&self, booking: &Booking) {
        if let Err(err) = self
            .conversations
            .create_or_get(booking.id, booking.service.as_str())
            .await
        {
            warn!(
                booking_id = %booking.id,
                error = %err,
                "conversation creation failed, booking kept"
            );
        }
    }
}
