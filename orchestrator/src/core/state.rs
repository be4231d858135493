//! Engine state shared by the run path and the health monitor
//!
//! Pure state management: module health states, initialization status, error
//! counters and the latest health snapshot. Callers serialize access through a
//! single `tokio::sync::Mutex`.

use chrono::{DateTime, Utc};
use shared::{ErrorKind, ErrorSummary, HealthSnapshot, ModuleHealthState, ModuleKind};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use super::error_tracker::ErrorTracker;
use crate::config::EngineConfig;

#[derive(Debug)]
pub struct EngineState {
    module_states: BTreeMap<ModuleKind, ModuleHealthState>,
    initialized: BTreeSet<ModuleKind>,
    errors: ErrorTracker,
    last_snapshot: Option<HealthSnapshot>,
    last_cycle_started: Option<Instant>,
}

impl EngineState {
    pub fn new(modules: impl IntoIterator<Item = ModuleKind>, config: &EngineConfig) -> Self {
        Self {
            module_states: modules
                .into_iter()
                .map(|kind| (kind, ModuleHealthState::Unknown))
                .collect(),
            initialized: BTreeSet::new(),
            errors: ErrorTracker::new(config.error_rate_window, config.error_alert_threshold),
            last_snapshot: None,
            last_cycle_started: None,
        }
    }

    pub fn module_state(&self, module: ModuleKind) -> ModuleHealthState {
        self.module_states.get(&module).copied().unwrap_or_default()
    }

    pub fn module_states(&self) -> &BTreeMap<ModuleKind, ModuleHealthState> {
        &self.module_states
    }

    pub fn set_module_state(&mut self, module: ModuleKind, state: ModuleHealthState) {
        self.module_states.insert(module, state);
    }

    pub fn is_initialized(&self, module: ModuleKind) -> bool {
        self.initialized.contains(&module)
    }

    pub fn mark_initialized(&mut self, module: ModuleKind) {
        self.initialized.insert(module);
        if self.module_state(module) == ModuleHealthState::Unknown {
            self.set_module_state(module, ModuleHealthState::Healthy);
        }
    }

    /// Initialization failure: excluded from runs until recovery succeeds
    pub fn mark_initialization_failed(&mut self, module: ModuleKind) {
        self.initialized.remove(&module);
        self.set_module_state(module, ModuleHealthState::Failed);
    }

    /// Apply a probe result to a module's state machine
    pub fn apply_probe(&mut self, module: ModuleKind, healthy: bool) -> ModuleHealthState {
        let next = self.module_state(module).after_probe(healthy);
        self.set_module_state(module, next);
        next
    }

    pub fn record_error(&mut self, context: &str, kind: ErrorKind) -> u64 {
        self.errors.record(context, kind)
    }

    pub fn error_count(&self, context: &str, kind: ErrorKind) -> u64 {
        self.errors.count(context, kind)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.total()
    }

    pub fn reset_errors(&mut self) {
        self.errors.reset();
    }

    pub fn error_summary(&mut self, now: DateTime<Utc>) -> ErrorSummary {
        self.errors.summary(now)
    }

    pub fn last_snapshot(&self) -> Option<&HealthSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn store_snapshot(&mut self, snapshot: HealthSnapshot) {
        self.last_snapshot = Some(snapshot);
    }

    /// Claim the next health check cycle unless one started within `min_interval`
    pub fn try_begin_cycle(&mut self, now: Instant, min_interval: std::time::Duration) -> bool {
        if let Some(started) = self.last_cycle_started {
            if now.duration_since(started) < min_interval {
                return false;
            }
        }
        self.last_cycle_started = Some(now);
        true
    }
}
