use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use parkwise_catalog::{Resource, ResourceCatalog};
use parkwise_core::booking::{Booking, VehicleIdentity};
use parkwise_core::{BookingStore, StoreResult};

/// Reference `BookingStore` used by the engine tests. A durable
/// implementation replaces this behind the same trait; reference-code
/// uniqueness is enforced here the way a unique index would.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;
        if bookings.values().any(|b| b.reference == booking.reference) {
            return Err(format!("reference code already taken: {}", booking.reference).into());
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn update(&self, booking: &Booking) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;
        if !bookings.contains_key(&booking.id) {
            return Err(format!("unknown booking: {}", booking.id).into());
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn list_active_for_resource(&self, resource_id: Uuid) -> StoreResult<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.resource_id == resource_id && b.status.is_active_or_pending())
            .cloned()
            .collect())
    }

    async fn list_active_for_holder(&self, holder_id: &str) -> StoreResult<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.holder_id == holder_id && b.status.is_active_or_pending())
            .cloned()
            .collect())
    }

    async fn list_active_by_vehicle(&self, vehicle: &VehicleIdentity) -> StoreResult<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.vehicle.as_ref() == Some(vehicle) && b.status.is_active_or_pending())
            .cloned()
            .collect())
    }
}

/// In-memory resource catalog collaborator.
#[derive(Default)]
pub struct InMemoryResourceCatalog {
    resources: RwLock<HashMap<Uuid, Resource>>,
}

impl InMemoryResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, resource: Resource) {
        self.resources.write().await.insert(resource.id, resource);
    }
}

#[async_trait]
impl ResourceCatalog for InMemoryResourceCatalog {
    async fn get_resource(&self, id: Uuid) -> StoreResult<Option<Resource>> {
        Ok(self.resources.read().await.get(&id).cloned())
    }
}
