use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, VehicleIdentity};

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Durable home of bookings. The engine holds no state of its own between
/// calls; it reads and writes through this trait.
///
/// "active" in the list methods means active-or-pending status
/// (see [`crate::BookingStatus::is_active_or_pending`]).
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new booking. Must fail if the reference code is already
    /// taken; reference uniqueness is the store's responsibility.
    async fn insert(&self, booking: &Booking) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    async fn update(&self, booking: &Booking) -> StoreResult<()>;

    async fn list_active_for_resource(&self, resource_id: Uuid) -> StoreResult<Vec<Booking>>;

    async fn list_active_for_holder(&self, holder_id: &str) -> StoreResult<Vec<Booking>>;

    async fn list_active_by_vehicle(&self, vehicle: &VehicleIdentity) -> StoreResult<Vec<Booking>>;
}
