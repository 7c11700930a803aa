//! Session configuration.
//!
//! With the `serde` feature the configuration can be loaded from a YAML file;
//! every field is optional and falls back to its default:
//!
//! ```yaml
//! timeout: 2s
//! retry:
//!   attempts: 3
//!   delay: 1s
//! poll_interval: 1s
//! settings_refresh_ticks: 10
//! history_capacity: 1000
//! limits:
//!   min: 50
//!   max: 450
//! ```

use crate::error::{ConfigError, ValidationError};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::transport::RetryPolicy;
use std::time::Duration;

/// Highest temperature limit a station accepts, in °C.
pub const LIMIT_CEILING: u16 = 550;

/// Allowed set-point range in °C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TemperatureLimits {
    pub min: u16,
    pub max: u16,
}

impl Default for TemperatureLimits {
    fn default() -> Self {
        Self { min: 50, max: 450 }
    }
}

impl TemperatureLimits {
    /// Checked constructor enforcing `0 <= min < max <= 550`.
    pub fn new(min: u16, max: u16) -> Result<Self, ConfigError> {
        let limits = Self { min, max };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min < self.max && self.max <= LIMIT_CEILING {
            Ok(())
        } else {
            Err(ConfigError::InvalidLimits {
                min: self.min,
                max: self.max,
                ceiling: LIMIT_CEILING,
            })
        }
    }

    pub fn contains(&self, celsius: f32) -> bool {
        celsius >= f32::from(self.min) && celsius <= f32::from(self.max)
    }

    /// Rejects a temperature outside the limits.
    pub fn check(&self, celsius: f32) -> Result<(), ValidationError> {
        if self.contains(celsius) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                value: celsius,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SETTINGS_REFRESH_TICKS: u32 = 10;

/// Everything needed to run a station session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct StationConfig {
    /// Read timeout of the serial link.
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_timeout", with = "humantime_serde")
    )]
    pub timeout: Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    pub retry: RetryPolicy,
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_poll_interval", with = "humantime_serde")
    )]
    pub poll_interval: Duration,
    /// Set-points and presets are re-read every this many poll ticks; 0 disables it.
    #[cfg_attr(feature = "serde", serde(default = "default_settings_refresh_ticks"))]
    pub settings_refresh_ticks: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_history_capacity"))]
    pub history_capacity: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limits: TemperatureLimits,
}

#[cfg(feature = "serde")]
fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

#[cfg(feature = "serde")]
fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

#[cfg(feature = "serde")]
fn default_settings_refresh_ticks() -> u32 {
    DEFAULT_SETTINGS_REFRESH_TICKS
}

#[cfg(feature = "serde")]
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            settings_refresh_ticks: DEFAULT_SETTINGS_REFRESH_TICKS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            limits: TemperatureLimits::default(),
        }
    }
}

impl StationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;
        if self.retry.attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Loads and validates a YAML configuration file.
    #[cfg(feature = "serde")]
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: StationConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a YAML configuration.
    #[cfg(feature = "serde")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: StationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_limits() {
        let limits = TemperatureLimits::default();
        assert_eq!((limits.min, limits.max), (50, 450));
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn invalid_limits() {
        assert_matches!(
            TemperatureLimits::new(450, 50),
            Err(ConfigError::InvalidLimits { .. })
        );
        assert_matches!(
            TemperatureLimits::new(100, 100),
            Err(ConfigError::InvalidLimits { .. })
        );
        assert_matches!(
            TemperatureLimits::new(0, 551),
            Err(ConfigError::InvalidLimits { .. })
        );
        assert!(TemperatureLimits::new(0, 550).is_ok());
    }

    #[test]
    fn limit_check() {
        let limits = TemperatureLimits::default();
        assert_eq!(limits.check(50.0), Ok(()));
        assert_eq!(limits.check(450.0), Ok(()));
        assert_matches!(
            limits.check(500.0),
            Err(ValidationError::OutOfRange {
                min: 50,
                max: 450,
                ..
            })
        );
        assert_matches!(limits.check(f32::NAN), Err(ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn config_validation() {
        assert!(StationConfig::default().validate().is_ok());

        let mut config = StationConfig::default();
        config.retry.attempts = 0;
        assert_matches!(config.validate(), Err(ConfigError::ZeroAttempts));

        let mut config = StationConfig::default();
        config.history_capacity = 0;
        assert_matches!(config.validate(), Err(ConfigError::ZeroHistoryCapacity));

        let mut config = StationConfig::default();
        config.poll_interval = Duration::ZERO;
        assert_matches!(config.validate(), Err(ConfigError::ZeroPollInterval));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn yaml_with_defaults() {
        let config = StationConfig::from_yaml_str(
            "timeout: 500ms\nretry:\n  attempts: 5\nlimits:\n  min: 100\n  max: 400\n",
        )
        .unwrap();
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.limits, TemperatureLimits { min: 100, max: 400 });
    }

    #[cfg(feature = "serde")]
    #[test]
    fn yaml_with_invalid_limits() {
        assert_matches!(
            StationConfig::from_yaml_str("limits:\n  min: 400\n  max: 100\n"),
            Err(ConfigError::InvalidLimits { .. })
        );
        assert_matches!(
            StationConfig::from_yaml_str("timeout: [1, 2]\n"),
            Err(ConfigError::Parse(..))
        );
    }
}
