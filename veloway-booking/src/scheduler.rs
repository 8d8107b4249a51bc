use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use veloway_core::{CoreError, CoreResult};
use veloway_offer::{OfferRepository, OfferStatus};

use crate::repository::BookingRepository;
use crate::trip;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

struct Runner {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background fallback for drivers who forget to press start: a repeating
/// timer that advances pooling trips whose scheduled time has arrived.
/// Injectable with an explicit start/stop lifecycle; no global timer handle.
pub struct TripScheduler {
    offers: Arc<dyn OfferRepository>,
    bookings: Arc<dyn BookingRepository>,
    interval: Duration,
    runner: Mutex<Option<Runner>>,
}

impl TripScheduler {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        bookings: Arc<dyn BookingRepository>,
        interval: Duration,
    ) -> Self {
        Self {
            offers,
            bookings,
            interval,
            runner: Mutex::new(None),
        }
    }

    pub fn start(self: &Arc<Self>) -> CoreResult<()> {
        let mut runner = self.runner.lock();
        if runner.is_some() {
            return Err(CoreError::conflict("scheduler is already running"));
        }
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.interval);
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        scheduler.run_tick(Utc::now()).await;
                    }
                }
            }
            info!("trip scheduler stopped");
        });
        *runner = Some(Runner { cancel, handle });
        info!(interval_seconds = self.interval.as_secs(), "trip scheduler started");
        Ok(())
    }

    pub async fn stop(&self) {
        let runner = self.runner.lock().take();
        if let Some(runner) = runner {
            runner.cancel.cancel();
            let _ = runner.handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.runner.lock().is_some()
    }

    /// One scan over today's due pooling offers. Public so tests can drive
    /// ticks without the timer. Each offer is its own unit of work: one
    /// offer failing never halts the scan, and no lock is held across it.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> usize {
        let open = match self
            .offers
            .list_by_status(&[OfferStatus::Pending, OfferStatus::Active])
            .await
        {
            Ok(offers) => offers,
            Err(err) => {
                warn!(error = %err, "scheduler could not list open offers");
                return 0;
            }
        };

        let today = now.date_naive();
        let mut started = 0;
        for offer in open {
            if offer.date != today {
                continue;
            }
            // Rentals have no departure time and are never auto-started.
            let due = offer
                .scheduled_departure()
                .map_or(false, |at| at <= now.naive_utc());
            if !due {
                continue;
            }
            match trip::advance_eligible_bookings(self.bookings.as_ref(), offer.id, now, true).await
            {
                Ok(advanced) => {
                    if advanced > 0 {
                        info!(offer_id = %offer.id, bookings = advanced, "auto-started due trip");
                    }
                    started += advanced;
                }
                Err(err) => {
                    warn!(offer_id = %offer.id, error = %err, "auto-start failed, continuing scan");
                }
            }
        }
        started
    }
}
