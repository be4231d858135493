//! Service implementations
//!
//! Stateful collaborators of the orchestrator: persistence sinks, the analytics
//! recorder, the health monitor, the in-process module adapter and the run
//! scheduler.

pub mod analytics_recorder;
pub mod health_monitor;
pub mod local_module;
pub mod run_sink;
pub mod scheduler;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use analytics_recorder::AnalyticsRecorder;
pub use health_monitor::{HealthCheckOutcome, HealthMonitor, HealthReport, HealthTrigger, RecoveryOutcome};
pub use local_module::LocalGrowthModule;
pub use run_sink::{InMemoryRunSink, JsonlRunSink};
pub use scheduler::{delay_until, RunScheduler};
