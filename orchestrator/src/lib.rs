//! Growth orchestration engine
//!
//! Runs per-vertical optimization cycles across seven growth modules: a
//! strategy is generated, gated by compliance, fanned out to every module with
//! failure isolation, aggregated, recorded and scheduled. A background health
//! monitor probes modules and re-initializes them when overall health drops.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::EngineConfig;
pub use core::{CompliancePolicy, EngineState, ErrorTracker, HeuristicStrategyGenerator, PolicyComplianceValidator};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::GrowthOrchestrator;
pub use registry::ModuleRegistry;
pub use services::{
    AnalyticsRecorder, HealthCheckOutcome, HealthMonitor, HealthTrigger, InMemoryRunSink, JsonlRunSink,
    LocalGrowthModule, RunScheduler,
};
pub use traits::{ComplianceValidator, GrowthModule, RunSink, StrategyGenerator};
