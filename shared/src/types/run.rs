//! Optimization run records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ComplianceReport, FailureKind, ModuleKind, ModuleOutcome, ModuleResult, OptimizationStrategy,
    StrategySource, Vertical,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Compliance gate passed and every module settled
    Completed,
    /// Compliance gate raised blockers, no module was invoked
    ComplianceBlocked,
}

/// Aggregate record of one `execute_growth_optimization` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub run_id: Uuid,
    pub vertical: Vertical,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub strategy: OptimizationStrategy,
    pub compliance: ComplianceReport,
    pub results: Vec<ModuleResult>,
    pub success_count: usize,
    pub failure_count: usize,
    pub estimated_roi: f64,
    pub average_performance: f64,
    pub next_run_at: DateTime<Utc>,
}

impl OptimizationRun {
    pub fn is_blocked(&self) -> bool {
        self.status == RunStatus::ComplianceBlocked
    }

    pub fn result_for(&self, module: ModuleKind) -> Option<&ModuleResult> {
        self.results.iter().find(|result| result.module == module)
    }

    pub fn total_investment(&self) -> f64 {
        self.results
            .iter()
            .filter_map(ModuleResult::report)
            .map(|report| report.investment)
            .sum()
    }

    pub fn total_estimated_return(&self) -> f64 {
        self.results
            .iter()
            .filter_map(ModuleResult::report)
            .map(|report| report.estimated_return)
            .sum()
    }

    /// Compact form persisted by the analytics recorder (no payloads)
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            vertical: self.vertical.clone(),
            status: self.status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            strategy_source: self.strategy.source.clone(),
            confidence_score: self.strategy.confidence_score,
            compliance_score: self.compliance.overall_score,
            warning_count: self.compliance.warnings.len(),
            blocker_count: self.compliance.blockers.len(),
            success_count: self.success_count,
            failure_count: self.failure_count,
            estimated_roi: self.estimated_roi,
            average_performance: self.average_performance,
            total_investment: self.total_investment(),
            total_estimated_return: self.total_estimated_return(),
            next_run_at: self.next_run_at,
        }
    }

    /// One metric row per invoked module
    pub fn module_metrics(&self) -> Vec<ModuleMetricRow> {
        self.results
            .iter()
            .map(|result| {
                let (investment, estimated_return, performance, failure) = match &result.outcome {
                    ModuleOutcome::Completed(report) => (
                        report.investment,
                        report.estimated_return,
                        Some(report.performance),
                        None,
                    ),
                    ModuleOutcome::Failed(failure) => (0.0, 0.0, None, Some(failure.kind)),
                };
                ModuleMetricRow {
                    run_id: self.run_id,
                    vertical: self.vertical.clone(),
                    module: result.module,
                    recorded_at: self.finished_at,
                    success: result.is_success(),
                    investment,
                    estimated_return,
                    performance,
                    failure,
                }
            })
            .collect()
    }
}

/// Durable summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub vertical: Vertical,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub strategy_source: StrategySource,
    pub confidence_score: f64,
    pub compliance_score: f64,
    pub warning_count: usize,
    pub blocker_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub estimated_roi: f64,
    pub average_performance: f64,
    pub total_investment: f64,
    pub total_estimated_return: f64,
    pub next_run_at: DateTime<Utc>,
}

/// Durable per-module metric row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetricRow {
    pub run_id: Uuid,
    pub vertical: Vertical,
    pub module: ModuleKind,
    pub recorded_at: DateTime<Utc>,
    pub success: bool,
    pub investment: f64,
    pub estimated_return: f64,
    pub performance: Option<f64>,
    pub failure: Option<FailureKind>,
}

/// Whatever a run had gathered when orchestration itself failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRun {
    pub run_id: Uuid,
    pub vertical: Vertical,
    pub started_at: DateTime<Utc>,
    pub strategy: Option<OptimizationStrategy>,
    pub compliance: Option<ComplianceReport>,
    pub results: Vec<ModuleResult>,
}

impl PartialRun {
    pub fn new(run_id: Uuid, vertical: Vertical, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            vertical,
            started_at,
            strategy: None,
            compliance: None,
            results: Vec::new(),
        }
    }
}
