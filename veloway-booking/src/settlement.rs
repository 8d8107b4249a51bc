use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use veloway_core::{CoreError, CoreResult};
use veloway_shared::round2;

use crate::models::{Booking, BookingStatus, PaymentMethod, PaymentStatus, SettlementStatus};
use crate::repository::{BookingRepository, LedgerRepository};

/// Reconciles who owes whom after a trip completes, and runs the admin
/// approval workflow for operator payouts.
#[derive(Clone)]
pub struct SettlementLedger {
    bookings: Arc<dyn BookingRepository>,
    ledger: Arc<dyn LedgerRepository>,
}

impl SettlementLedger {
    pub fn new(bookings: Arc<dyn BookingRepository>, ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { bookings, ledger }
    }

    /// Apply ledger effects for a booking that just completed. Cash: the
    /// operator kept the full fare and owes the platform only the fee.
    /// Online: the net amount pays down the operator's cash debt first,
    /// anything left becomes a payout claim.
    pub(crate) async fn settle_completed(&self, booking: &mut Booking) -> CoreResult<()> {
        let operator_id = booking.operator.user_id;
        match booking.payment_method {
            PaymentMethod::Cash => {
                self.ledger
                    .increment_outflow(operator_id, booking.platform_fee)
                    .await?;
                booking.payment_status = PaymentStatus::Paid;
                booking.settlement_status = SettlementStatus::Pending;
                booking.settlement_amount = Some(booking.platform_fee);
                info!(
                    booking_id = %booking.id,
                    fee = booking.platform_fee,
                    "cash trip settled, fee added to operator outflow"
                );
            }
            PaymentMethod::Online => {
                let net = booking.amount;
                let applied = self.ledger.decrement_outflow(operator_id, net).await?;
                let remainder = round2(net - applied);
                if remainder > 0.0 {
                    self.ledger.increment_inflow(operator_id, remainder).await?;
                }
                booking.settlement_status = SettlementStatus::Requested;
                booking.settlement_requested_at = Some(Utc::now());
                booking.settlement_amount = Some(net);
                info!(
                    booking_id = %booking.id,
                    net,
                    debt_cleared = applied,
                    credited = remainder,
                    "online trip settled, payout requested"
                );
            }
        }
        booking.touch();
        Ok(())
    }

    /// Admin: approve a requested payout. The actual transfer is the payment
    /// authority's job.
    pub async fn approve_settlement(&self, booking_id: Uuid) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        if booking.settlement_status != SettlementStatus::Requested {
            return Err(CoreError::conflict("settlement is not awaiting approval"));
        }
        booking.settlement_status = SettlementStatus::Approved;
        booking.settlement_resolved_at = Some(Utc::now());
        booking.touch();
        self.bookings.update(booking.clone()).await?;
        info!(booking_id = %booking.id, "settlement approved");
        Ok(booking)
    }

    /// Admin: reject a requested payout, with a reason. Terminal.
    pub async fn reject_settlement(&self, booking_id: Uuid, reason: &str) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        if booking.settlement_status != SettlementStatus::Requested {
            return Err(CoreError::conflict("settlement is not awaiting approval"));
        }
        booking.settlement_status = SettlementStatus::Rejected;
        booking.settlement_resolved_at = Some(Utc::now());
        booking.settlement_note = Some(reason.to_string());
        booking.touch();
        self.bookings.update(booking.clone()).await?;
        info!(booking_id = %booking.id, reason, "settlement rejected");
        Ok(booking)
    }

    /// Operator: (re-)request a payout for a completed online trip, e.g.
    /// after a rejection.
    pub async fn request_withdrawal(
        &self,
        booking_id: Uuid,
        operator_id: Uuid,
    ) -> CoreResult<Booking> {
        let mut booking = self.bookings.get(booking_id).await?;
        if booking.operator.user_id != operator_id {
            return Err(CoreError::conflict(
                "only the trip operator may request withdrawal",
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(CoreError::conflict("trip is not completed"));
        }
        if booking.payment_method == PaymentMethod::Cash {
            return Err(CoreError::conflict(
                "cash trips settle at drop-off, there is nothing to withdraw",
            ));
        }
        if booking.settlement_status == SettlementStatus::Approved {
            return Err(CoreError::conflict("settlement is already approved"));
        }
        booking.settlement_status = SettlementStatus::Requested;
        booking.settlement_requested_at = Some(Utc::now());
        booking.settlement_resolved_at = None;
        booking.settlement_note = None;
        booking.touch();
        self.bookings.update(booking.clone()).await?;
        Ok(booking)
    }
}
