pub mod pricing;
pub mod resource;

pub use pricing::{PricingConfig, PricingEngine};
pub use resource::{RateCard, Resource, ResourceCatalog};
