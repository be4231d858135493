//! Trait definitions with mockall annotations for testing
//!
//! Every collaborator of the orchestrator sits behind one of these traits so the
//! composition root can inject real adapters and tests can inject mocks.

use chrono::{DateTime, Utc};
use shared::{
    ComplianceReport, ModuleAnalytics, ModuleMetricRow, ModuleReport, ModuleWeights,
    OptimizationStrategy, RunContext, RunSummary, Timeframe, Vertical,
};

use crate::error::OrchestratorResult;

/// Uniform contract implemented by each of the seven growth modules
#[mockall::automock]
#[async_trait::async_trait]
pub trait GrowthModule: Send + Sync {
    /// Prepare the module for work. Must be idempotent: repeat calls after a
    /// success are no-ops and never fail because of the repeat.
    async fn initialize(&self) -> OrchestratorResult<()>;

    /// Execute the module for one run
    ///
    /// # Parameters
    /// - `context`: run id and vertical; side effects should be idempotent per pair
    /// - `weights`: this module's slice of the run strategy
    ///
    /// The caller enforces a timeout; an adapter that overruns is counted as failed.
    async fn run(&self, context: &RunContext, weights: &ModuleWeights) -> OrchestratorResult<ModuleReport>;

    /// Read-only analytics. `vertical = None` means all verticals.
    async fn get_analytics(&self, vertical: Option<Vertical>, timeframe: Timeframe) -> OrchestratorResult<ModuleAnalytics>;

    /// Cheap self-test. `None` means the module has no health check, which the
    /// caller treats as healthy.
    async fn health_check(&self) -> Option<bool> {
        None
    }
}

/// Produces the per-vertical module weighting for a run
#[mockall::automock]
#[async_trait::async_trait]
pub trait StrategyGenerator: Send + Sync {
    async fn generate(&self, vertical: &Vertical) -> OrchestratorResult<OptimizationStrategy>;
}

/// Scores a proposed strategy against policy before execution
#[mockall::automock]
#[async_trait::async_trait]
pub trait ComplianceValidator: Send + Sync {
    async fn validate(&self, vertical: &Vertical, strategy: &OptimizationStrategy) -> OrchestratorResult<ComplianceReport>;
}

/// Append-only durable store for run summaries and module metric rows
#[mockall::automock]
#[async_trait::async_trait]
pub trait RunSink: Send + Sync {
    async fn append_run(&self, summary: &RunSummary) -> OrchestratorResult<()>;

    async fn append_module_metrics(&self, rows: &[ModuleMetricRow]) -> OrchestratorResult<()>;

    /// Summaries finished at or after `since`, oldest first
    async fn load_runs(&self, vertical: Option<Vertical>, since: DateTime<Utc>) -> OrchestratorResult<Vec<RunSummary>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_trait_instantiation() {
        let _module = MockGrowthModule::new();
        let _generator = MockStrategyGenerator::new();
        let _validator = MockComplianceValidator::new();
        let _sink = MockRunSink::new();
    }

    struct BareModule;

    #[async_trait::async_trait]
    impl GrowthModule for BareModule {
        async fn initialize(&self) -> OrchestratorResult<()> {
            Ok(())
        }

        async fn run(&self, _context: &RunContext, _weights: &ModuleWeights) -> OrchestratorResult<ModuleReport> {
            unreachable!("not exercised")
        }

        async fn get_analytics(&self, _vertical: Option<Vertical>, _timeframe: Timeframe) -> OrchestratorResult<ModuleAnalytics> {
            Ok(ModuleAnalytics::default())
        }
    }

    #[tokio::test]
    async fn test_health_check_defaults_to_absent() {
        assert_eq!(BareModule.health_check().await, None);
    }
}
