use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::info;
use uuid::Uuid;

use veloway_core::identity::IdentityVerifier;
use veloway_core::{CoreError, CoreResult};
use veloway_offer::{Offer, OfferRepository, TimeSlot, TripOperator, Vehicle};
use veloway_shared::{Place, Route};

/// An identity document the operator registered with.
#[derive(Debug, Clone)]
pub struct OperatorDocument {
    pub document_type: String,
    pub number: String,
}

#[derive(Debug, Clone)]
pub struct PoolingOfferDraft {
    pub operator: TripOperator,
    pub date: NaiveDate,
    pub vehicle: Vehicle,
    pub route: Route,
    pub departure: NaiveTime,
    pub total_seats: u32,
}

#[derive(Debug, Clone)]
pub struct RentalOfferDraft {
    pub operator: TripOperator,
    pub date: NaiveDate,
    pub vehicle: Vehicle,
    pub pickup: Place,
    pub hourly_rate: f64,
    pub available_from: String,
    pub available_until: String,
    pub minimum_hours: u32,
}

/// Where operators publish offers. Publishing is gated on the external
/// identity provider's verified/unverified verdict.
#[derive(Clone)]
pub struct OfferDesk {
    offers: Arc<dyn OfferRepository>,
    identity: Arc<dyn IdentityVerifier>,
}

impl OfferDesk {
    pub fn new(offers: Arc<dyn OfferRepository>, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self { offers, identity }
    }

    pub async fn publish_pooling_offer(
        &self,
        draft: PoolingOfferDraft,
        document: &OperatorDocument,
    ) -> CoreResult<Offer> {
        if draft.total_seats == 0 {
            return Err(CoreError::validation("a pooling offer needs at least one seat"));
        }
        self.ensure_verified(document).await?;

        let offer = Offer::new_pooling(
            draft.operator,
            draft.date,
            draft.vehicle,
            draft.route,
            draft.departure,
            draft.total_seats,
        );
        self.offers.insert(offer.clone()).await?;
        info!(offer_id = %offer.id, seats = draft.total_seats, "pooling offer published");
        Ok(offer)
    }

    pub async fn publish_rental_offer(
        &self,
        draft: RentalOfferDraft,
        document: &OperatorDocument,
    ) -> CoreResult<Offer> {
        let window = TimeSlot::parse(&draft.available_from, &draft.available_until)?;
        if draft.hourly_rate <= 0.0 {
            return Err(CoreError::validation("hourly rate must be positive"));
        }
        if draft.minimum_hours == 0 {
            return Err(CoreError::validation("minimum hours must be at least 1"));
        }
        self.ensure_verified(document).await?;

        let offer = Offer::new_rental(
            draft.operator,
            draft.date,
            draft.vehicle,
            draft.pickup,
            draft.hourly_rate,
            window,
            draft.minimum_hours,
        );
        self.offers.insert(offer.clone()).await?;
        info!(offer_id = %offer.id, "rental offer published");
        Ok(offer)
    }

    /// Fetch an offer for display, counting the view.
    pub async fn view_offer(&self, offer_id: Uuid) -> CoreResult<Offer> {
        self.offers.record_view(offer_id).await?;
        self.offers.get(offer_id).await
    }

    async fn ensure_verified(&self, document: &OperatorDocument) -> CoreResult<()> {
        let outcome = self
            .identity
            .verify(&document.document_type, &document.number, None)
            .await?;
        if !outcome.verified {
            return Err(CoreError::conflict("operator identity is not verified"));
        }
        Ok(())
    }
}
