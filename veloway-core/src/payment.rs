use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreResult;

/// An order registered with the external payment authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String, // Provider's ID (e.g., order_123)
    pub booking_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Opaque payment gateway. The engine only reacts to the boolean outcome of
/// `verify_payment`; authorization, capture and refunds live with the provider.
#[async_trait]
pub trait PaymentAuthority: Send + Sync {
    /// Register an order for the booking's total amount.
    async fn create_order(&self, booking_id: Uuid, amount: f64) -> CoreResult<PaymentOrder>;

    /// Check whether the referenced payment went through.
    async fn verify_payment(&self, order_id: &str, signature: &str) -> CoreResult<bool>;
}

pub struct MockPaymentAuthority;

#[async_trait]
impl PaymentAuthority for MockPaymentAuthority {
    async fn create_order(&self, booking_id: Uuid, amount: f64) -> CoreResult<PaymentOrder> {
        Ok(PaymentOrder {
            id: format!("order_{}", booking_id.simple()),
            booking_id,
            amount,
            currency: "INR".to_string(),
            created_at: Utc::now(),
        })
    }

    async fn verify_payment(&self, order_id: &str, signature: &str) -> CoreResult<bool> {
        // Trigger for testing the unverified path
        if signature == "bad-signature" {
            return Ok(false);
        }
        Ok(order_id.starts_with("order_") && !signature.is_empty())
    }
}
