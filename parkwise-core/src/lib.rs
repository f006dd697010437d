pub mod booking;
pub mod money;
pub mod payment;
pub mod repository;

pub use booking::{
    Booking, BookingStatus, DurationUnit, PriceBreakdown, PricingTier, TimeWindow,
    VehicleIdentity,
};
pub use payment::{
    FailingPaymentGateway, MockPaymentGateway, PaymentGateway, PaymentRecord, PaymentStatus,
};
pub use repository::{BookingStore, StoreResult};

use uuid::Uuid;

/// One error taxonomy for the whole reservation engine. Every public
/// operation returns this; nothing is thrown across the engine boundary.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(Uuid),

    #[error("Resource is inactive: {0}")]
    ResourceInactive(Uuid),

    #[error("Actor {actor} may not perform {action} on this booking")]
    Unauthorized { actor: String, action: String },

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    #[error("Resource {resource_id} has no free spot: {active} of {total} in use")]
    CapacityExceeded {
        resource_id: Uuid,
        active: usize,
        total: i32,
    },

    #[error("Vehicle {vehicle} already holds an overlapping booking ({reference})")]
    VehicleConflict { vehicle: String, reference: String },

    #[error("Holder already has an overlapping booking on this resource ({reference})")]
    DuplicateHolderBooking { reference: String },

    #[error("Cannot {action} a booking in status {from}")]
    InvalidStateTransition { from: BookingStatus, action: String },

    #[error("Check-in attempted {minutes_until_start} minutes before window start")]
    TooEarly { minutes_until_start: i64 },

    #[error("Store error: {0}")]
    Store(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ReservationError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ReservationError::Store(err.to_string())
    }
}

pub type ReservationResult<T> = Result<T, ReservationError>;
