use serde::Deserialize;
use std::env;
use std::time::Duration;

use veloway_pricing::RateCard;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub pricing: RateCard,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
}

fn default_tick_seconds() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings = config::Config::builder()
            // Base configuration file, then the environment-specific one,
            // then an uncommitted local override
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `VELOWAY_SCHEDULER__TICK_SECONDS=30`
            .add_source(config::Environment::with_prefix("VELOWAY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(60));
        assert_eq!(config.pricing.car_rate_per_km, 8.0);
        assert_eq!(config.pricing.minimum_platform_fee, 5.0);
    }
}
