//! Health monitor
//!
//! Probes every registered module, keeps the per-module state machine in
//! `EngineState` current and triggers a bounded recovery pass when the overall
//! score drops below the configured threshold.

use chrono::Utc;
use futures_util::future::join_all;
use futures_util::FutureExt;
use shared::{
    component_debug, component_error, component_info, component_warn, ComponentId, ErrorKind, HealthSnapshot,
    ModuleHealthState, ModuleKind, SystemHealth,
};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::EngineState;
use crate::error::OrchestratorError;
use crate::orchestrator::panic_message;
use crate::registry::ModuleRegistry;

/// What asked for a health check cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTrigger {
    Scheduled,
    Manual,
}

impl std::fmt::Display for HealthTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthTrigger::Scheduled => f.write_str("scheduled"),
            HealthTrigger::Manual => f.write_str("manual"),
        }
    }
}

/// Result of one recovery pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecoveryOutcome {
    /// Modules re-initialized, in the order they were attempted
    pub attempted: Vec<ModuleKind>,
    pub recovered: Vec<ModuleKind>,
    pub failed: Vec<(ModuleKind, String)>,
    pub counters_reset: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub trigger: HealthTrigger,
    pub snapshot: HealthSnapshot,
    pub recovery: Option<RecoveryOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthCheckOutcome {
    Completed(HealthReport),
    /// A cycle already started within the minimum interval
    RateLimited { last_snapshot: Option<HealthSnapshot> },
}

impl HealthCheckOutcome {
    pub fn snapshot(&self) -> Option<&HealthSnapshot> {
        match self {
            HealthCheckOutcome::Completed(report) => Some(&report.snapshot),
            HealthCheckOutcome::RateLimited { last_snapshot } => last_snapshot.as_ref(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, HealthCheckOutcome::RateLimited { .. })
    }
}

pub struct HealthMonitor {
    registry: Arc<ModuleRegistry>,
    state: Arc<Mutex<EngineState>>,
    config: EngineConfig,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ModuleRegistry>, state: Arc<Mutex<EngineState>>, config: EngineConfig) -> Self {
        Self {
            registry,
            state,
            config,
        }
    }

    /// Run one health check cycle unless rate limited
    pub async fn run_health_check(&self, trigger: HealthTrigger) -> HealthCheckOutcome {
        {
            let mut state = self.state.lock().await;
            if !state.try_begin_cycle(Instant::now(), self.config.min_health_check_interval) {
                component_debug!(
                    ComponentId::HealthMonitor,
                    "⏳ {} health check skipped, previous cycle is too recent",
                    trigger
                );
                return HealthCheckOutcome::RateLimited {
                    last_snapshot: state.last_snapshot().cloned(),
                };
            }
        }

        let probes = self.probe_all().await;
        let snapshot = HealthSnapshot::from_probes(Utc::now(), probes);

        {
            let mut state = self.state.lock().await;
            for (kind, healthy) in &snapshot.module_healthy {
                let previous = state.module_state(*kind);
                let next = state.apply_probe(*kind, *healthy);
                if previous != next {
                    component_info!(
                        ComponentId::Module(*kind),
                        "🩺 Health state {} -> {}",
                        previous,
                        next
                    );
                }
            }
            state.store_snapshot(snapshot.clone());
        }

        component_info!(
            ComponentId::HealthMonitor,
            "🩺 {} health check: score {:.1} ({} unhealthy)",
            trigger,
            snapshot.overall_health_score,
            snapshot.unhealthy_modules().len()
        );

        let recovery = if snapshot.overall_health_score < self.config.health_threshold {
            Some(self.recover(&snapshot.unhealthy_modules()).await)
        } else {
            None
        };

        HealthCheckOutcome::Completed(HealthReport {
            trigger,
            snapshot,
            recovery,
        })
    }

    /// Probe all modules concurrently. Uninitialized modules, probe panics and
    /// probes exceeding the module timeout count as unhealthy.
    async fn probe_all(&self) -> BTreeMap<ModuleKind, bool> {
        let initialized: Vec<(ModuleKind, bool)> = {
            let state = self.state.lock().await;
            self.registry
                .kinds()
                .into_iter()
                .map(|kind| (kind, state.is_initialized(kind)))
                .collect()
        };

        let module_timeout = self.config.module_timeout;
        let probes = self.registry.iter().map(|(kind, module)| {
            let module = Arc::clone(module);
            async move {
                let healthy = match timeout(module_timeout, AssertUnwindSafe(module.health_check()).catch_unwind()).await {
                    Ok(Ok(Some(healthy))) => healthy,
                    Ok(Ok(None)) => true,
                    Ok(Err(_)) => {
                        component_warn!(ComponentId::Module(kind), "💥 Health probe panicked");
                        false
                    }
                    Err(_) => {
                        component_warn!(
                            ComponentId::Module(kind),
                            "⏱️ Health probe exceeded {:?}",
                            module_timeout
                        );
                        false
                    }
                };
                (kind, healthy)
            }
        });

        let results = join_all(probes).await;
        results
            .into_iter()
            .map(|(kind, healthy)| {
                let was_initialized = initialized
                    .iter()
                    .any(|(k, initialized)| *k == kind && *initialized);
                (kind, healthy && was_initialized)
            })
            .collect()
    }

    /// Sequentially re-initialize every module, previously failing ones first
    async fn recover(&self, failing: &[ModuleKind]) -> RecoveryOutcome {
        component_warn!(
            ComponentId::HealthMonitor,
            "🔧 Health below {:.0}, starting recovery ({} failing)",
            self.config.health_threshold,
            failing.len()
        );

        let mut order: Vec<ModuleKind> = failing.to_vec();
        order.extend(self.registry.kinds().into_iter().filter(|kind| !failing.contains(kind)));

        let mut outcome = RecoveryOutcome::default();
        for kind in order {
            let Some(module) = self.registry.get(kind) else {
                continue;
            };
            let was_failing = failing.contains(&kind);
            outcome.attempted.push(kind);

            if was_failing {
                self.state
                    .lock()
                    .await
                    .set_module_state(kind, ModuleHealthState::Recovering);
            }

            let result = match timeout(self.config.module_timeout, AssertUnwindSafe(module.initialize()).catch_unwind()).await {
                Ok(Ok(result)) => result.map_err(|e| e.to_string()),
                Ok(Err(panic)) => Err(panic_message(panic)),
                Err(_) => Err(format!("initialize exceeded {:?}", self.config.module_timeout)),
            };

            let mut state = self.state.lock().await;
            match result {
                Ok(()) => {
                    state.mark_initialized(kind);
                    state.set_module_state(kind, ModuleHealthState::Healthy);
                    outcome.recovered.push(kind);
                }
                Err(reason) => {
                    let error = OrchestratorError::RecoveryFailure {
                        module: kind,
                        reason: reason.clone(),
                    };
                    component_error!(ComponentId::Module(kind), "❌ {}", error);
                    state.record_error(&ComponentId::Module(kind).to_string(), error.kind());
                    if was_failing {
                        state.mark_initialization_failed(kind);
                    } else {
                        state.set_module_state(kind, ModuleHealthState::Degraded);
                    }
                    outcome.failed.push((kind, reason));
                }
            }
        }

        let all_failing_recovered = failing.iter().all(|kind| outcome.recovered.contains(kind));
        if all_failing_recovered {
            self.state.lock().await.reset_errors();
            outcome.counters_reset = true;
            component_info!(
                ComponentId::HealthMonitor,
                "✅ Recovery complete, {} modules re-initialized",
                outcome.recovered.len()
            );
        } else {
            component_error!(
                ComponentId::HealthMonitor,
                "❌ Recovery incomplete: {} modules still failing",
                outcome.failed.len()
            );
        }

        outcome
    }

    /// Current health export with operator recommendations
    pub async fn system_health(&self) -> SystemHealth {
        let mut state = self.state.lock().await;
        let module_health = state.module_states().clone();
        let last_snapshot = state.last_snapshot().cloned();
        let error_summary = state.error_summary(Utc::now());
        drop(state);

        let overall_health = match &last_snapshot {
            Some(snapshot) => snapshot.overall_health_score,
            None if module_health.is_empty() => 100.0,
            None => {
                let healthy = module_health.values().filter(|s| s.is_healthy()).count();
                100.0 * healthy as f64 / module_health.len() as f64
            }
        };

        let mut recommendations = Vec::new();
        if last_snapshot.is_none() {
            recommendations.push("No health check has completed yet".to_string());
        }
        if overall_health < self.config.health_threshold {
            recommendations.push(format!(
                "Overall health {:.0} is below the recovery threshold {:.0}",
                overall_health, self.config.health_threshold
            ));
        }
        for (kind, module_state) in &module_health {
            match module_state {
                ModuleHealthState::Failed => recommendations.push(format!(
                    "Module {} is failed; re-initialization did not succeed",
                    kind
                )),
                ModuleHealthState::Degraded => recommendations.push(format!(
                    "Module {} is degraded; check its upstream dependencies",
                    kind
                )),
                _ => {}
            }
        }
        for alert in &error_summary.alerts {
            recommendations.push(format!(
                "{} reported {} {} errors",
                alert.context, alert.count, alert.kind
            ));
        }
        if error_summary.errors_per_minute > 1.0 {
            recommendations.push(format!(
                "Error rate is {:.2}/min over the last window",
                error_summary.errors_per_minute
            ));
        }
        if recommendations.is_empty() {
            recommendations.push("All systems operational".to_string());
        }

        SystemHealth {
            overall_health,
            module_health,
            last_check: last_snapshot.map(|snapshot| snapshot.timestamp),
            error_summary,
            recommendations,
        }
    }

    /// Run scheduled health checks until `cancel` fires
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.health_check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            component_info!(
                ComponentId::HealthMonitor,
                "🩺 Health monitor started, interval {:?}",
                self.config.health_check_interval
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.run_health_check(HealthTrigger::Scheduled).await;
                    }
                }
            }

            component_info!(ComponentId::HealthMonitor, "🛑 Health monitor stopped");
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn error_count(&self, context: &str, kind: ErrorKind) -> u64 {
        self.state.lock().await.error_count(context, kind)
    }
}
