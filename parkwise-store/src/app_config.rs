use serde::Deserialize;
use std::env;

use parkwise_catalog::PricingConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub business_rules: BusinessRules,
}

/// Engine knobs with the production defaults baked in; deployments override
/// through config files or `PARKWISE__` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub tax_rate_bps: i64,
    pub service_fee_bps: i64,
    pub checkin_early_minutes: i64,
    pub full_refund_hours: i64,
    pub refund_cutoff_hours: i64,
    pub partial_refund_bps: i64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            tax_rate_bps: 1_800,
            service_fee_bps: 500,
            checkin_early_minutes: 30,
            full_refund_hours: 24,
            refund_cutoff_hours: 2,
            partial_refund_bps: 5_000,
        }
    }
}

impl BusinessRules {
    pub fn pricing_config(&self) -> PricingConfig {
        PricingConfig {
            tax_bps: self.tax_rate_bps,
            service_fee_bps: self.service_fee_bps,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = BusinessRules::default();

        let s = config::Config::builder()
            .set_default("business_rules.tax_rate_bps", defaults.tax_rate_bps)?
            .set_default("business_rules.service_fee_bps", defaults.service_fee_bps)?
            .set_default(
                "business_rules.checkin_early_minutes",
                defaults.checkin_early_minutes,
            )?
            .set_default("business_rules.full_refund_hours", defaults.full_refund_hours)?
            .set_default(
                "business_rules.refund_cutoff_hours",
                defaults.refund_cutoff_hours,
            )?
            .set_default(
                "business_rules.partial_refund_bps",
                defaults.partial_refund_bps,
            )?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PARKWISE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_rates() {
        let rules = BusinessRules::default();
        assert_eq!(rules.tax_rate_bps, 1_800);
        assert_eq!(rules.service_fee_bps, 500);
        assert_eq!(rules.checkin_early_minutes, 30);

        let pricing = rules.pricing_config();
        assert_eq!(pricing.tax_bps, 1_800);
        assert_eq!(pricing.service_fee_bps, 500);
    }

    #[test]
    fn load_without_files_uses_defaults() {
        let config = Config::load().unwrap();
        assert_eq!(config.business_rules.full_refund_hours, 24);
        assert_eq!(config.business_rules.refund_cutoff_hours, 2);
        assert_eq!(config.business_rules.partial_refund_bps, 5_000);
    }
}
