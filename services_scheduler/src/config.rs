//! Scheduler configuration

use crate::error::SchedulerError;
use core_types::{Duration, Filter};
use serde::{Deserialize, Serialize};

/// Default request server port
pub const DEFAULT_PORT: u16 = 7400;

/// Default poll timeout for ticks that did no work
pub const DEFAULT_IDLE_POLL_TIMEOUT_MS: u64 = 250;

/// Upper bound on the idle poll timeout
pub const MAX_IDLE_POLL_TIMEOUT_MS: u64 = 60_000;

/// Default bound on queued sequences
pub const DEFAULT_MAX_PENDING_SEQUENCES: usize = 1024;

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Request server listening port
    pub port: u16,
    /// How long an idle tick may wait for client requests
    pub idle_poll_timeout_ms: u64,
    /// Groups allowed when the scheduler starts
    pub initial_groups: Vec<String>,
    /// Sequences the queue may hold before further builds are dropped
    pub max_pending_sequences: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            idle_poll_timeout_ms: DEFAULT_IDLE_POLL_TIMEOUT_MS,
            initial_groups: vec!["system".to_string()],
            max_pending_sequences: DEFAULT_MAX_PENDING_SEQUENCES,
        }
    }
}

impl SchedulerConfig {
    /// Checks the settings, returning the allowed-groups filter they name
    pub fn validate(&self) -> Result<Filter, SchedulerError> {
        if self.idle_poll_timeout_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "idle_poll_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.idle_poll_timeout_ms > MAX_IDLE_POLL_TIMEOUT_MS {
            return Err(SchedulerError::InvalidConfig(format!(
                "idle_poll_timeout_ms must be at most {}",
                MAX_IDLE_POLL_TIMEOUT_MS
            )));
        }
        if self.max_pending_sequences == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_pending_sequences must be greater than zero".to_string(),
            ));
        }
        self.initial_filter()
    }

    /// Parses `initial_groups` into group bits
    pub fn initial_filter(&self) -> Result<Filter, SchedulerError> {
        let mut filter = Filter::NONE;
        for name in &self.initial_groups {
            let parsed: Filter = name
                .parse()
                .map_err(|err| SchedulerError::InvalidConfig(format!("{}", err)))?;
            if !parsed.roles().is_empty() {
                return Err(SchedulerError::InvalidConfig(format!(
                    "{} is a role, not a group",
                    name
                )));
            }
            filter |= parsed;
        }
        Ok(filter)
    }

    pub fn idle_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_poll_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.port, 7400);
        assert_eq!(config.idle_poll_timeout(), Duration::from_millis(250));
        assert_eq!(config.validate().unwrap(), Filter::SYSTEM);
    }

    #[test]
    fn test_zero_idle_timeout_rejected() {
        let config = SchedulerConfig {
            idle_poll_timeout_ms: 0,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_durations() {
        let config = SchedulerConfig {
            idle_poll_timeout_ms: 20_000_000_000_000,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SchedulerError::InvalidConfig(_))
        ));

        let ceiling = SchedulerConfig {
            idle_poll_timeout_ms: MAX_IDLE_POLL_TIMEOUT_MS,
            ..SchedulerConfig::default()
        };
        assert!(ceiling.validate().is_ok());
        assert_eq!(ceiling.idle_poll_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_queue_bound_rejected() {
        let config = SchedulerConfig {
            max_pending_sequences: 0,
            ..SchedulerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_initial_groups_parse() {
        let config = SchedulerConfig {
            initial_groups: vec!["system".to_string(), "group4".to_string()],
            ..SchedulerConfig::default()
        };
        assert_eq!(
            config.initial_filter().unwrap(),
            Filter::SYSTEM | Filter::group(4).unwrap()
        );

        let roles = SchedulerConfig {
            initial_groups: vec!["master".to_string()],
            ..SchedulerConfig::default()
        };
        assert!(roles.initial_filter().is_err());

        let unknown = SchedulerConfig {
            initial_groups: vec!["ops".to_string()],
            ..SchedulerConfig::default()
        };
        assert!(unknown.initial_filter().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.idle_poll_timeout_ms, DEFAULT_IDLE_POLL_TIMEOUT_MS);
        assert_eq!(config.initial_groups, vec!["system".to_string()]);
        assert_eq!(config.max_pending_sequences, DEFAULT_MAX_PENDING_SEQUENCES);
    }
}
