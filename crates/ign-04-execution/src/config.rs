//! Execution configuration from defaults or environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value '{value}' for {var}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// A field is out of its allowed range.
    #[error("invalid {field}: {reason}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Allowed range.
        reason: &'static str,
    },
}

/// Policy knobs of the execution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Blocks on top of (and including) the receipt's block before a
    /// transaction counts as confirmed.
    pub required_confirmations: u64,

    /// Wait between polls when no future made progress.
    pub block_polling_interval: Duration,

    /// How long a transaction may stay pending before its fees are bumped.
    pub time_before_bumping_fees: Duration,

    /// Fee bumps per interaction and run before the future times out.
    pub max_fee_bumps: u32,

    /// Futures driven at the same time.
    pub max_concurrent_futures: usize,

    /// Retries of a failing chain request before the run aborts.
    pub max_infrastructure_retries: u32,

    /// Minimum fee increase of a replacement transaction, in percent.
    pub fee_bump_percent: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            required_confirmations: 5,
            block_polling_interval: Duration::from_millis(200),
            time_before_bumping_fees: Duration::from_secs(180),
            max_fee_bumps: 4,
            max_concurrent_futures: 5,
            max_infrastructure_retries: 3,
            fee_bump_percent: 10,
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        Err(_) => Ok(default),
    }
}

impl ExecutionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `IGN_REQUIRED_CONFIRMATIONS` (default: 5)
    /// - `IGN_BLOCK_POLLING_INTERVAL_MS` (default: 200)
    /// - `IGN_TIME_BEFORE_BUMPING_FEES_MS` (default: 180000)
    /// - `IGN_MAX_FEE_BUMPS` (default: 4)
    /// - `IGN_MAX_CONCURRENT_FUTURES` (default: 5)
    /// - `IGN_MAX_INFRASTRUCTURE_RETRIES` (default: 3)
    /// - `IGN_FEE_BUMP_PERCENT` (default: 10)
    ///
    /// Unset variables keep their default; set but unparsable ones are an
    /// error. The result is validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            required_confirmations: parse_var("IGN_REQUIRED_CONFIRMATIONS", defaults.required_confirmations)?,
            block_polling_interval: Duration::from_millis(parse_var(
                "IGN_BLOCK_POLLING_INTERVAL_MS",
                millis(defaults.block_polling_interval),
            )?),
            time_before_bumping_fees: Duration::from_millis(parse_var(
                "IGN_TIME_BEFORE_BUMPING_FEES_MS",
                millis(defaults.time_before_bumping_fees),
            )?),
            max_fee_bumps: parse_var("IGN_MAX_FEE_BUMPS", defaults.max_fee_bumps)?,
            max_concurrent_futures: parse_var("IGN_MAX_CONCURRENT_FUTURES", defaults.max_concurrent_futures)?,
            max_infrastructure_retries: parse_var(
                "IGN_MAX_INFRASTRUCTURE_RETRIES",
                defaults.max_infrastructure_retries,
            )?,
            fee_bump_percent: parse_var("IGN_FEE_BUMP_PERCENT", defaults.fee_bump_percent)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.required_confirmations == 0 {
            return Err(ConfigError::OutOfRange {
                field: "required_confirmations",
                reason: "must be at least 1",
            });
        }
        if self.max_concurrent_futures == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_concurrent_futures",
                reason: "must be at least 1",
            });
        }
        if self.block_polling_interval.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "block_polling_interval",
                reason: "must be positive",
            });
        }
        // Nodes reject replacements priced less than 10% above the original.
        if self.fee_bump_percent < 10 {
            return Err(ConfigError::OutOfRange {
                field: "fee_bump_percent",
                reason: "must be at least 10",
            });
        }
        Ok(())
    }

    /// A configuration suited to an automining development chain.
    #[must_use]
    pub fn local() -> Self {
        Self {
            required_confirmations: 1,
            block_polling_interval: Duration::from_millis(50),
            ..Self::default()
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutionConfig::default();
        assert_eq!(config.required_confirmations, 5);
        assert_eq!(config.max_fee_bumps, 4);
        assert_eq!(config.fee_bump_percent, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_config() {
        let config = ExecutionConfig::local();
        assert_eq!(config.required_confirmations, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = ExecutionConfig {
            max_concurrent_futures: 0,
            ..ExecutionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "max_concurrent_futures",
                reason: "must be at least 1",
            })
        );

        let config = ExecutionConfig {
            fee_bump_percent: 5,
            ..ExecutionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env() {
        // Only this test touches these variables.
        env::set_var("IGN_MAX_FEE_BUMPS", "2");
        env::set_var("IGN_BLOCK_POLLING_INTERVAL_MS", "25");
        let config = ExecutionConfig::from_env().unwrap();
        assert_eq!(config.max_fee_bumps, 2);
        assert_eq!(config.block_polling_interval, Duration::from_millis(25));

        env::set_var("IGN_MAX_FEE_BUMPS", "many");
        assert_eq!(
            ExecutionConfig::from_env(),
            Err(ConfigError::InvalidVar {
                var: "IGN_MAX_FEE_BUMPS",
                value: "many".to_string(),
            })
        );

        env::remove_var("IGN_MAX_FEE_BUMPS");
        env::remove_var("IGN_BLOCK_POLLING_INTERVAL_MS");
    }
}
