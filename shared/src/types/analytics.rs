//! Analytics read models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{ModuleAnalytics, ModuleKind, RunStatus, Timeframe, Vertical};

/// Entry in the recorder's bounded recent-metrics buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub run_id: Uuid,
    pub vertical: Vertical,
    pub recorded_at: DateTime<Utc>,
    pub status: RunStatus,
    pub success_count: usize,
    pub failure_count: usize,
    pub estimated_roi: f64,
    pub average_performance: f64,
    pub compliance_score: f64,
}

/// Aggregated view over recorded runs and module analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateAnalytics {
    /// `None` means every vertical
    pub vertical: Option<Vertical>,
    pub timeframe: Timeframe,
    pub generated_at: DateTime<Utc>,
    pub total_runs: usize,
    pub completed_runs: usize,
    pub blocked_runs: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate: f64,
    pub average_roi: f64,
    pub average_compliance_score: f64,
    pub average_performance: f64,
    pub total_investment: f64,
    pub total_estimated_return: f64,
    pub module_analytics: BTreeMap<ModuleKind, ModuleAnalytics>,
    /// Modules whose analytics query failed or timed out
    pub unavailable_modules: Vec<ModuleKind>,
}
