use serde::{Deserialize, Serialize};

use parkwise_core::booking::{DurationUnit, PriceBreakdown, PricingTier, TimeWindow};
use parkwise_core::money::{bps_of, div_ceil, Minor};

use crate::resource::Resource;

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_WEEK: i64 = SECONDS_PER_DAY * 7;
const SECONDS_PER_MONTH: i64 = SECONDS_PER_DAY * 30;

/// Tax and service fee as basis points of the base amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub tax_bps: i64,
    pub service_fee_bps: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_bps: 1_800,
            service_fee_bps: 500,
        }
    }
}

/// Quote computation. Pure: identical inputs always yield an identical
/// breakdown, so the same call serves both previews and booking creation.
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn quote(
        &self,
        resource: &Resource,
        window: &TimeWindow,
        tier: PricingTier,
        discount_code: Option<&str>,
    ) -> PriceBreakdown {
        let seconds = window.duration_seconds().max(0);
        let (units, unit, rate) = match tier {
            PricingTier::Hourly => (
                div_ceil(seconds, SECONDS_PER_HOUR),
                DurationUnit::Hours,
                resource.rates.hourly_minor,
            ),
            PricingTier::Daily => (
                div_ceil(seconds, SECONDS_PER_DAY),
                DurationUnit::Days,
                resource.rates.daily_minor,
            ),
            PricingTier::Weekly => (
                div_ceil(seconds, SECONDS_PER_WEEK),
                DurationUnit::Weeks,
                resource.rates.weekly_minor,
            ),
            PricingTier::Monthly => (
                div_ceil(seconds, SECONDS_PER_MONTH),
                DurationUnit::Months,
                resource.rates.monthly_minor,
            ),
        };

        let base = units * rate;
        let tax = bps_of(base, self.config.tax_bps);
        let fee = bps_of(base, self.config.service_fee_bps);
        let discount = discount_amount(base, discount_code);
        let total = (base + tax + fee - discount).max(0);

        PriceBreakdown {
            base_minor: base,
            tax_minor: tax,
            service_fee_minor: fee,
            discount_minor: discount,
            total_minor: total,
            duration_value: units,
            duration_unit: unit,
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

/// Closed discount-code table. Codes have no expiry, usage limits, or
/// eligibility rules; unknown or absent codes discount nothing. The discount
/// never exceeds the base amount.
fn discount_amount(base_minor: Minor, code: Option<&str>) -> Minor {
    let discount = match code {
        Some("FIRST10") => bps_of(base_minor, 1_000),
        Some("PARK20") => bps_of(base_minor, 2_000),
        Some("SAVE50") => 50 * 100,
        _ => 0,
    };
    discount.min(base_minor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use parkwise_core::booking::TimeWindow;
    use parkwise_core::money::Minor;
    use uuid::Uuid;

    fn resource(hourly: Minor) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            owner_id: "vendor-1".to_string(),
            name: "Central Lot".to_string(),
            total_spots: 4,
            is_active: true,
            rates: crate::resource::RateCard {
                hourly_minor: hourly,
                daily_minor: hourly * 8,
                weekly_minor: hourly * 40,
                monthly_minor: hourly * 120,
            },
        }
    }

    fn window_hours(hours: i64) -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::hours(hours))
    }

    #[test]
    fn two_hours_at_fifty() {
        let engine = PricingEngine::default();
        let quote = engine.quote(&resource(5_000), &window_hours(2), PricingTier::Hourly, None);

        assert_eq!(quote.base_minor, 10_000);
        assert_eq!(quote.tax_minor, 1_800);
        assert_eq!(quote.service_fee_minor, 500);
        assert_eq!(quote.discount_minor, 0);
        assert_eq!(quote.total_minor, 12_300);
        assert_eq!(quote.duration_value, 2);
        assert_eq!(quote.duration_unit, DurationUnit::Hours);
    }

    #[test]
    fn partial_units_bill_as_full() {
        let engine = PricingEngine::default();
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        let window = TimeWindow::new(start, start + Duration::minutes(61));

        let quote = engine.quote(&resource(5_000), &window, PricingTier::Hourly, None);
        assert_eq!(quote.duration_value, 2);
        assert_eq!(quote.base_minor, 10_000);

        // 8 days on the weekly tier is two weeks
        let window = TimeWindow::new(start, start + Duration::days(8));
        let quote = engine.quote(&resource(5_000), &window, PricingTier::Weekly, None);
        assert_eq!(quote.duration_value, 2);
        assert_eq!(quote.duration_unit, DurationUnit::Weeks);
    }

    #[test]
    fn park20_arithmetic() {
        let engine = PricingEngine::default();
        // 4 hours at 50.00 -> base 200.00
        let quote = engine.quote(
            &resource(5_000),
            &window_hours(4),
            PricingTier::Hourly,
            Some("PARK20"),
        );

        assert_eq!(quote.base_minor, 20_000);
        assert_eq!(quote.tax_minor, 3_600);
        assert_eq!(quote.service_fee_minor, 1_000);
        assert_eq!(quote.discount_minor, 4_000);
        assert_eq!(quote.total_minor, 20_600);
    }

    #[test]
    fn flat_discount_capped_at_base() {
        let engine = PricingEngine::default();
        // one hour at 0.30 -> base below the flat 50.00 discount
        let quote = engine.quote(
            &resource(30),
            &window_hours(1),
            PricingTier::Hourly,
            Some("SAVE50"),
        );

        assert_eq!(quote.base_minor, 30);
        assert_eq!(quote.discount_minor, 30);
        assert!(quote.total_minor >= 0);
    }

    #[test]
    fn unknown_code_discounts_nothing() {
        let engine = PricingEngine::default();
        let quote = engine.quote(
            &resource(5_000),
            &window_hours(2),
            PricingTier::Hourly,
            Some("NOPE99"),
        );
        assert_eq!(quote.discount_minor, 0);
    }

    #[test]
    fn quote_is_deterministic() {
        let engine = PricingEngine::default();
        let res = resource(5_000);
        let window = window_hours(3);

        let a = engine.quote(&res, &window, PricingTier::Hourly, Some("FIRST10"));
        let b = engine.quote(&res, &window, PricingTier::Hourly, Some("FIRST10"));
        assert_eq!(a, b);
    }

    #[test]
    fn longer_windows_never_cost_less() {
        let engine = PricingEngine::default();
        let res = resource(5_000);

        let mut previous = 0;
        for hours in 1..=48 {
            let quote = engine.quote(&res, &window_hours(hours), PricingTier::Hourly, None);
            assert!(quote.total_minor >= previous);
            previous = quote.total_minor;
        }
    }
}
