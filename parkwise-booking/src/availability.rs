use std::sync::Arc;

use uuid::Uuid;

use parkwise_catalog::Resource;
use parkwise_core::booking::{TimeWindow, VehicleIdentity};
use parkwise_core::{BookingStore, StoreResult};

/// Result of a capacity count against a resource.
#[derive(Debug, Clone, Copy)]
pub struct CapacityCheck {
    pub granted: bool,
    pub active_count: usize,
}

/// Answers "can this window be granted" questions against the booking store.
/// Counts only active-or-pending bookings; half-open windows, so touching
/// endpoints never conflict.
pub struct AvailabilityChecker {
    store: Arc<dyn BookingStore>,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Count overlapping active-or-pending bookings on the resource and grant
    /// iff a spot remains. A resource with zero (or negative) capacity always
    /// denies. `exclude` skips the booking under amendment.
    pub async fn check_capacity(
        &self,
        resource: &Resource,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> StoreResult<CapacityCheck> {
        let active_count = self
            .store
            .list_active_for_resource(resource.id)
            .await?
            .iter()
            .filter(|b| Some(b.id) != exclude && b.window.overlaps(window))
            .count();

        let granted = resource.total_spots > 0 && (active_count as i32) < resource.total_spots;
        Ok(CapacityCheck {
            granted,
            active_count,
        })
    }

    /// Cross-resource vehicle uniqueness: returns the reference of any
    /// active-or-pending booking holding the same identity over an
    /// overlapping window. Only called when an identity was supplied.
    pub async fn find_vehicle_conflict(
        &self,
        vehicle: &VehicleIdentity,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<String>> {
        let conflict = self
            .store
            .list_active_by_vehicle(vehicle)
            .await?
            .into_iter()
            .find(|b| Some(b.id) != exclude && b.window.overlaps(window))
            .map(|b| b.reference);
        Ok(conflict)
    }

    /// Same holder, same resource, overlapping window.
    pub async fn find_duplicate_holder_booking(
        &self,
        holder_id: &str,
        resource_id: Uuid,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<String>> {
        let duplicate = self
            .store
            .list_active_for_holder(holder_id)
            .await?
            .into_iter()
            .find(|b| {
                Some(b.id) != exclude && b.resource_id == resource_id && b.window.overlaps(window)
            })
            .map(|b| b.reference);
        Ok(duplicate)
    }
}
