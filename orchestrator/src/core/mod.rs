//! Core business logic modules
//!
//! This module contains pure logic with no I/O dependencies: strategy tables,
//! compliance policy, result aggregation, error counting and engine state.

pub mod aggregation;
pub mod compliance;
pub mod error_tracker;
pub mod state;
pub mod strategy;

pub use aggregation::{aggregate, next_run_delay, RunAggregate, DEFAULT_AVERAGE_PERFORMANCE};
pub use compliance::{CompliancePolicy, PolicyComplianceValidator, PriorityRule};
pub use error_tracker::ErrorTracker;
pub use state::EngineState;
pub use strategy::{HeuristicStrategyGenerator, TABLE_VERSION};
