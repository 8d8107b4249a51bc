pub mod models;
pub mod offer_desk;
pub mod orchestrator;
pub mod repository;
pub mod scheduler;
pub mod settlement;
pub mod trip;

pub use models::{
    Booking, BookingStatus, Cancellation, PassengerStatus, PaymentMethod, PaymentStatus, Schedule,
    SettlementStatus,
};
pub use offer_desk::{OfferDesk, OperatorDocument, PoolingOfferDraft, RentalOfferDraft};
pub use orchestrator::{BookingOrchestrator, PoolingBookingRequest, RentalBookingRequest};
pub use repository::{BookingRepository, LedgerBalances, LedgerRepository};
pub use scheduler::TripScheduler;
pub use settlement::SettlementLedger;
pub use trip::TripService;
