//! Engine configuration
//!
//! Defaults are overridden by `GROWTH_*` environment variables (a `.env` file is
//! honoured) and then by command line flags in the binary.

use std::env;
use std::time::Duration;

use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Base delay between runs of one vertical, scaled by `1 + average_performance`
    pub base_run_interval: Duration,
    /// Upper bound for one module `run`, `health_check` or analytics call
    pub module_timeout: Duration,
    /// Period of the scheduled health check
    pub health_check_interval: Duration,
    /// Minimum spacing between two health check cycles, manual or scheduled
    pub min_health_check_interval: Duration,
    /// Recovery starts when the health score drops below this (0-100)
    pub health_threshold: f64,
    /// Counters above this count emit an alert
    pub error_alert_threshold: u64,
    /// Window used for the rolling error rate
    pub error_rate_window: Duration,
    /// Capacity of the recorder's recent-metrics ring buffer
    pub metrics_capacity: usize,
    /// Delay before a scheduled vertical is retried after an orchestration failure
    pub retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_run_interval: Duration::from_secs(60 * 60),
            module_timeout: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(60),
            min_health_check_interval: Duration::from_secs(30),
            health_threshold: 70.0,
            error_alert_threshold: 5,
            error_rate_window: Duration::from_secs(15 * 60),
            metrics_capacity: 1000,
            retry_delay: Duration::from_secs(5 * 60),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `GROWTH_*` environment variables
    pub fn from_env() -> OrchestratorResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> OrchestratorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, "GROWTH_BASE_INTERVAL_SECS")? {
            config.base_run_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "GROWTH_MODULE_TIMEOUT_SECS")? {
            config.module_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "GROWTH_HEALTH_INTERVAL_SECS")? {
            config.health_check_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "GROWTH_HEALTH_MIN_INTERVAL_SECS")? {
            config.min_health_check_interval = Duration::from_secs(secs);
        }
        if let Some(threshold) = parse_var::<f64, _>(&lookup, "GROWTH_HEALTH_THRESHOLD")? {
            config.health_threshold = threshold;
        }
        if let Some(threshold) = parse_var::<u64, _>(&lookup, "GROWTH_ERROR_ALERT_THRESHOLD")? {
            config.error_alert_threshold = threshold;
        }
        if let Some(capacity) = parse_var::<usize, _>(&lookup, "GROWTH_METRICS_CAPACITY")? {
            config.metrics_capacity = capacity;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "GROWTH_RETRY_DELAY_SECS")? {
            config.retry_delay = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.base_run_interval.is_zero() {
            return Err(OrchestratorError::config("base_run_interval must be greater than zero"));
        }
        if self.module_timeout.is_zero() {
            return Err(OrchestratorError::config("module_timeout must be greater than zero"));
        }
        if self.health_check_interval.is_zero() {
            return Err(OrchestratorError::config("health_check_interval must be greater than zero"));
        }
        if self.min_health_check_interval > self.health_check_interval {
            return Err(OrchestratorError::config(
                "min_health_check_interval must not exceed health_check_interval",
            ));
        }
        if !(0.0..=100.0).contains(&self.health_threshold) {
            return Err(OrchestratorError::config("health_threshold must be within 0-100"));
        }
        if self.metrics_capacity == 0 {
            return Err(OrchestratorError::config("metrics_capacity must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> OrchestratorResult<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| OrchestratorError::config(format!("{key} has invalid value {raw:?}"))),
    }
}
