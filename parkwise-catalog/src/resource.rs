use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parkwise_core::money::Minor;
use parkwise_core::StoreResult;

/// Per-resource rates, one per pricing tier, in minor units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateCard {
    pub hourly_minor: Minor,
    pub daily_minor: Minor,
    pub weekly_minor: Minor,
    pub monthly_minor: Minor,
}

/// A capacity-constrained physical resource: a parking space offering
/// `total_spots` interchangeable spots. Read-only to the engine; treated as
/// immutable for the duration of any availability/pricing computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub total_spots: i32,
    pub is_active: bool,
    pub rates: RateCard,
}

/// Read side of the resource catalog collaborator.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    async fn get_resource(&self, id: Uuid) -> StoreResult<Option<Resource>>;
}
