pub mod availability;
pub mod lifecycle;
pub mod locks;
pub mod orchestrator;
pub mod refund;

pub use availability::{AvailabilityChecker, CapacityCheck};
pub use lifecycle::{Actor, BookingLifecycle, LifecycleAction};
pub use orchestrator::{AmendBookingRequest, CreateBookingRequest, ReservationOrchestrator};
pub use refund::{RefundPolicy, RefundSchedule};
