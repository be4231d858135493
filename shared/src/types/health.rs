//! Health monitoring and error tracking types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ModuleKind;

/// Per-module health state machine
///
/// `Unknown -> Healthy <-> Degraded -> Recovering -> Healthy | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModuleHealthState {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Recovering,
    Failed,
}

impl ModuleHealthState {
    /// State after a probe. Recovery-in-progress is left alone.
    pub fn after_probe(self, healthy: bool) -> Self {
        match (self, healthy) {
            (ModuleHealthState::Recovering, _) => ModuleHealthState::Recovering,
            (_, true) => ModuleHealthState::Healthy,
            (_, false) => ModuleHealthState::Degraded,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ModuleHealthState::Healthy)
    }
}

impl fmt::Display for ModuleHealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModuleHealthState::Unknown => "unknown",
            ModuleHealthState::Healthy => "healthy",
            ModuleHealthState::Degraded => "degraded",
            ModuleHealthState::Recovering => "recovering",
            ModuleHealthState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Point-in-time result of probing every module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub module_healthy: BTreeMap<ModuleKind, bool>,
    /// `100 * healthy / total`, 100 when no modules are registered
    pub overall_health_score: f64,
}

impl HealthSnapshot {
    pub fn from_probes(timestamp: DateTime<Utc>, module_healthy: BTreeMap<ModuleKind, bool>) -> Self {
        let total = module_healthy.len();
        let healthy = module_healthy.values().filter(|ok| **ok).count();
        let overall_health_score = if total == 0 {
            100.0
        } else {
            100.0 * healthy as f64 / total as f64
        };

        Self {
            timestamp,
            module_healthy,
            overall_health_score,
        }
    }

    pub fn unhealthy_modules(&self) -> Vec<ModuleKind> {
        self.module_healthy
            .iter()
            .filter(|(_, healthy)| !**healthy)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

/// Error taxonomy used for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Initialization,
    StrategyGeneration,
    ComplianceEvaluation,
    ModuleExecution,
    Timeout,
    Orchestration,
    Recovery,
    Persistence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Initialization => "initialization",
            ErrorKind::StrategyGeneration => "strategy_generation",
            ErrorKind::ComplianceEvaluation => "compliance_evaluation",
            ErrorKind::ModuleExecution => "module_execution",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Orchestration => "orchestration",
            ErrorKind::Recovery => "recovery",
            ErrorKind::Persistence => "persistence",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCount {
    pub context: String,
    pub kind: ErrorKind,
    pub count: u64,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ErrorSummary {
    pub total_errors: u64,
    pub errors_per_minute: f64,
    /// Counters ordered by count, highest first
    pub counters: Vec<ErrorCount>,
    /// Counters above the alert threshold
    pub alerts: Vec<ErrorCount>,
}

/// Health/status export for operational dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub overall_health: f64,
    pub module_health: BTreeMap<ModuleKind, ModuleHealthState>,
    pub last_check: Option<DateTime<Utc>>,
    pub error_summary: ErrorSummary,
    pub recommendations: Vec<String>,
}
