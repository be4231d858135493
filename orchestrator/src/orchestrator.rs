//! Growth orchestrator
//!
//! Coordinates one optimization run per call: lazy module initialization,
//! strategy generation, the compliance gate, a settle-all fan-out over every
//! registered module, aggregation, scheduling of the next run and recording.
//! All collaborators are injected.

use chrono::Utc;
use futures_util::future::join_all;
use futures_util::FutureExt;
use shared::{
    component_debug, component_error, component_info, component_warn, logging, AggregateAnalytics, ComponentId,
    ErrorKind, FailureKind, ModuleAnalytics, ModuleKind, ModuleResult, OptimizationRun, OptimizationStrategy,
    PartialRun, RunContext, RunStatus, RunSummary, SystemHealth, Timeframe, Vertical,
};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::core::{aggregate, next_run_delay, EngineState};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::registry::ModuleRegistry;
use crate::services::{AnalyticsRecorder, HealthMonitor};
use crate::traits::{ComplianceValidator, StrategyGenerator};

/// Entry point of the growth engine
pub struct GrowthOrchestrator<G, V>
where
    G: StrategyGenerator + 'static,
    V: ComplianceValidator + 'static,
{
    registry: Arc<ModuleRegistry>,

    /// Injected services
    strategy_generator: G,
    compliance_validator: V,
    recorder: Arc<AnalyticsRecorder>,

    /// Module states, error counters and the latest health snapshot
    state: Arc<Mutex<EngineState>>,
    health_monitor: Arc<HealthMonitor>,
    config: EngineConfig,

    /// Number of modules that initialized on the first attempt
    init: OnceCell<usize>,
    vertical_locks: Mutex<HashMap<Vertical, Arc<Mutex<()>>>>,
}

impl<G, V> GrowthOrchestrator<G, V>
where
    G: StrategyGenerator + 'static,
    V: ComplianceValidator + 'static,
{
    /// Create a new orchestrator with injected dependencies
    pub fn new(
        registry: ModuleRegistry,
        strategy_generator: G,
        compliance_validator: V,
        recorder: Arc<AnalyticsRecorder>,
        config: EngineConfig,
    ) -> Self {
        let missing = registry.missing();
        if !missing.is_empty() {
            component_warn!(
                ComponentId::Orchestrator,
                missing = ?missing,
                "⚠️ Registry lacks {} of {} modules; runs will report fewer results",
                missing.len(),
                ModuleKind::ALL.len()
            );
        }
        let registry = Arc::new(registry);
        let state = Arc::new(Mutex::new(EngineState::new(registry.kinds(), &config)));
        let health_monitor = Arc::new(HealthMonitor::new(
            Arc::clone(&registry),
            Arc::clone(&state),
            config.clone(),
        ));

        Self {
            registry,
            strategy_generator,
            compliance_validator,
            recorder,
            state,
            health_monitor,
            config,
            init: OnceCell::new(),
            vertical_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Initialize every module once per process. Concurrent callers wait for
    /// the same attempt. Returns how many modules initialized successfully.
    pub async fn initialize_modules(&self) -> usize {
        *self.init.get_or_init(|| self.initialize_all()).await
    }

    async fn initialize_all(&self) -> usize {
        component_debug!(
            ComponentId::Orchestrator,
            "🚀 Initializing {} growth modules...",
            self.registry.len()
        );

        let module_timeout = self.config.module_timeout;
        let attempts = self.registry.iter().map(|(kind, module)| {
            let module = Arc::clone(module);
            async move {
                let result = match timeout(module_timeout, AssertUnwindSafe(module.initialize()).catch_unwind()).await {
                    Ok(Ok(Ok(()))) => Ok(()),
                    Ok(Ok(Err(e))) => Err(e.to_string()),
                    Ok(Err(panic)) => Err(panic_message(panic)),
                    Err(_) => Err(format!("initialize exceeded {:?}", module_timeout)),
                };
                (kind, result)
            }
        });
        let outcomes = join_all(attempts).await;

        let mut state = self.state.lock().await;
        let mut initialized = 0;
        for (kind, result) in outcomes {
            match result {
                Ok(()) => {
                    state.mark_initialized(kind);
                    initialized += 1;
                }
                Err(reason) => {
                    let error = OrchestratorError::InitializationFailure { module: kind, reason };
                    component_error!(ComponentId::Module(kind), "❌ {}", error);
                    state.record_error(&ComponentId::Module(kind).to_string(), error.kind());
                    state.mark_initialization_failed(kind);
                }
            }
        }
        drop(state);

        logging::log_success(
            ComponentId::Orchestrator,
            &format!("{}/{} growth modules initialized", initialized, self.registry.len()),
        );
        initialized
    }

    async fn vertical_lock(&self, vertical: &Vertical) -> Arc<Mutex<()>> {
        let mut locks = self.vertical_locks.lock().await;
        Arc::clone(locks.entry(vertical.clone()).or_default())
    }

    async fn record_error(&self, context: &str, kind: ErrorKind) {
        self.state.lock().await.record_error(context, kind);
    }

    /// Wrap an unexpected failure with whatever the run gathered so far
    async fn orchestration_failure(
        &self,
        stage: &str,
        cause: OrchestratorError,
        partial: PartialRun,
    ) -> OrchestratorError {
        self.record_error(&ComponentId::Orchestrator.to_string(), cause.kind()).await;
        let run_id = partial.run_id;
        let error = OrchestratorError::OrchestrationFailure {
            stage: stage.to_string(),
            reason: cause.to_string(),
            partial: Box::new(partial),
        };
        logging::log_error(ComponentId::Orchestrator, &format!("Run {} at stage '{}'", run_id, stage), &error);
        error
    }

    /// Run one complete optimization cycle for `vertical`
    ///
    /// Runs for the same vertical are serialized; different verticals proceed
    /// in parallel.
    pub async fn execute_growth_optimization(&self, vertical: &Vertical) -> OrchestratorResult<OptimizationRun> {
        let lock = self.vertical_lock(vertical).await;
        let _guard = lock.lock().await;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut partial = PartialRun::new(run_id, vertical.clone(), started_at);
        component_info!(ComponentId::Orchestrator, "🚀 Starting run {} for '{}'", run_id, vertical);

        self.initialize_modules().await;

        let strategy = self.generate_strategy(vertical).await;
        partial.strategy = Some(strategy.clone());

        let compliance = match self.compliance_validator.validate(vertical, &strategy).await {
            Ok(report) => report,
            Err(e) => return Err(self.orchestration_failure("compliance", e, partial).await),
        };
        partial.compliance = Some(compliance.clone());

        let (status, results) = if compliance.is_blocked() {
            component_warn!(
                ComponentId::Orchestrator,
                "🚫 Run {} for '{}' blocked by compliance: {}",
                run_id,
                vertical,
                compliance.blockers.join("; ")
            );
            (RunStatus::ComplianceBlocked, Vec::new())
        } else {
            let context = RunContext {
                run_id,
                vertical: vertical.clone(),
            };
            (RunStatus::Completed, self.fan_out(&context, &strategy).await)
        };
        partial.results = results.clone();

        let totals = aggregate(&results, strategy.confidence_score);
        let finished_at = Utc::now();
        let delay = next_run_delay(self.config.base_run_interval, totals.average_performance);
        let next_run_at = match chrono::Duration::from_std(delay)
            .ok()
            .and_then(|delay| finished_at.checked_add_signed(delay))
        {
            Some(next_run_at) => next_run_at,
            None => {
                let cause = OrchestratorError::config(format!("next run delay {:?} out of range", delay));
                return Err(self.orchestration_failure("schedule", cause, partial).await);
            }
        };

        let run = OptimizationRun {
            run_id,
            vertical: vertical.clone(),
            status,
            started_at,
            finished_at,
            strategy,
            compliance,
            results,
            success_count: totals.success_count,
            failure_count: totals.failure_count,
            estimated_roi: totals.estimated_roi,
            average_performance: totals.average_performance,
            next_run_at,
        };

        if let Err(e) = self.recorder.record(&run).await {
            logging::log_error(ComponentId::Recorder, &format!("Recording run {}", run_id), &e);
            self.record_error(&ComponentId::Recorder.to_string(), e.kind()).await;
        }

        component_info!(
            ComponentId::Orchestrator,
            "✅ Run {} for '{}' finished: {} ok / {} failed, ROI {:.2}, next run at {}",
            run_id,
            vertical,
            run.success_count,
            run.failure_count,
            run.estimated_roi,
            run.next_run_at
        );
        Ok(run)
    }

    /// Strategy for this run, or the conservative default when generation fails
    async fn generate_strategy(&self, vertical: &Vertical) -> OptimizationStrategy {
        match self.strategy_generator.generate(vertical).await {
            Ok(strategy) => strategy,
            Err(e) => {
                component_warn!(
                    ComponentId::Orchestrator,
                    "⚠️ Strategy generation for '{}' failed, using conservative default: {}",
                    vertical,
                    e
                );
                self.record_error(&ComponentId::Orchestrator.to_string(), ErrorKind::StrategyGeneration)
                    .await;
                OptimizationStrategy::conservative_default(vertical.clone())
            }
        }
    }

    /// Invoke every registered module and wait for all of them to settle
    async fn fan_out(&self, context: &RunContext, strategy: &OptimizationStrategy) -> Vec<ModuleResult> {
        let ready: Vec<ModuleKind> = {
            let state = self.state.lock().await;
            self.registry
                .kinds()
                .into_iter()
                .filter(|kind| state.is_initialized(*kind))
                .collect()
        };

        let module_timeout = self.config.module_timeout;
        let invocations = self.registry.iter().map(|(kind, module)| {
            let module = Arc::clone(module);
            let weights = strategy.weights_for(kind);
            let is_ready = ready.contains(&kind);
            async move {
                if !is_ready {
                    return ModuleResult::failed(kind, FailureKind::NotInitialized, "module failed to initialize");
                }
                match timeout(module_timeout, AssertUnwindSafe(module.run(context, &weights)).catch_unwind()).await {
                    Ok(Ok(Ok(report))) => ModuleResult::completed(kind, report),
                    Ok(Ok(Err(e))) => ModuleResult::failed(kind, FailureKind::Execution, e.to_string()),
                    Ok(Err(panic)) => ModuleResult::failed(kind, FailureKind::Panicked, panic_message(panic)),
                    Err(_) => ModuleResult::failed(
                        kind,
                        FailureKind::Timeout,
                        format!("run exceeded {:?}", module_timeout),
                    ),
                }
            }
        });
        let results = join_all(invocations).await;

        let mut state = self.state.lock().await;
        for result in &results {
            if let Some(failure) = result.failure() {
                let kind = match failure.kind {
                    FailureKind::Timeout => ErrorKind::Timeout,
                    FailureKind::NotInitialized | FailureKind::Execution | FailureKind::Panicked => {
                        ErrorKind::ModuleExecution
                    }
                };
                component_warn!(
                    ComponentId::Module(result.module),
                    "⚠️ Run {} failed ({}): {}",
                    context.run_id,
                    failure.kind,
                    failure.message
                );
                state.record_error(&ComponentId::Module(result.module).to_string(), kind);
            }
        }

        results
    }

    /// Aggregated analytics over recorded runs plus each module's own view
    pub async fn get_growth_analytics(
        &self,
        vertical: Option<&Vertical>,
        timeframe: Timeframe,
    ) -> OrchestratorResult<AggregateAnalytics> {
        let generated_at = Utc::now();
        let since = timeframe.since(generated_at);

        let history = match self.recorder.history(vertical, since).await {
            Ok(history) => history,
            Err(e) => {
                self.record_error(&ComponentId::Recorder.to_string(), e.kind()).await;
                return Err(e);
            }
        };

        let module_timeout = self.config.module_timeout;
        let queries = self.registry.iter().map(|(kind, module)| {
            let module = Arc::clone(module);
            let vertical = vertical.cloned();
            async move {
                let analytics = timeout(
                    module_timeout,
                    AssertUnwindSafe(module.get_analytics(vertical, timeframe)).catch_unwind(),
                )
                .await;
                (kind, analytics)
            }
        });

        let mut module_analytics = BTreeMap::new();
        let mut unavailable_modules = Vec::new();
        for (kind, analytics) in join_all(queries).await {
            match analytics {
                Ok(Ok(Ok(analytics))) => {
                    module_analytics.insert(kind, analytics);
                }
                Ok(Ok(Err(e))) => {
                    component_debug!(ComponentId::Module(kind), "Analytics unavailable: {}", e);
                    unavailable_modules.push(kind);
                }
                Ok(Err(_)) | Err(_) => unavailable_modules.push(kind),
            }
        }

        Ok(summarize(
            vertical.cloned(),
            timeframe,
            generated_at,
            &history,
            module_analytics,
            unavailable_modules,
        ))
    }

    pub async fn get_system_health(&self) -> SystemHealth {
        self.health_monitor.system_health().await
    }

    pub fn health_monitor(&self) -> Arc<HealthMonitor> {
        Arc::clone(&self.health_monitor)
    }

    pub fn recorder(&self) -> Arc<AnalyticsRecorder> {
        Arc::clone(&self.recorder)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub async fn error_count(&self, context: &str, kind: ErrorKind) -> u64 {
        self.state.lock().await.error_count(context, kind)
    }
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Fold recorded run summaries into the aggregate analytics view
fn summarize(
    vertical: Option<Vertical>,
    timeframe: Timeframe,
    generated_at: chrono::DateTime<Utc>,
    history: &[RunSummary],
    module_analytics: BTreeMap<ModuleKind, ModuleAnalytics>,
    unavailable_modules: Vec<ModuleKind>,
) -> AggregateAnalytics {
    let completed: Vec<&RunSummary> = history.iter().filter(|run| run.status == RunStatus::Completed).collect();
    let success_count: usize = history.iter().map(|run| run.success_count).sum();
    let failure_count: usize = history.iter().map(|run| run.failure_count).sum();
    let attempts = success_count + failure_count;

    AggregateAnalytics {
        vertical,
        timeframe,
        generated_at,
        total_runs: history.len(),
        completed_runs: completed.len(),
        blocked_runs: history.len() - completed.len(),
        success_count,
        failure_count,
        success_rate: if attempts == 0 {
            0.0
        } else {
            success_count as f64 / attempts as f64
        },
        average_roi: mean(history.iter().map(|run| run.estimated_roi)),
        average_compliance_score: mean(history.iter().map(|run| run.compliance_score)),
        average_performance: mean(completed.iter().map(|run| run.average_performance)),
        total_investment: history.iter().map(|run| run.total_investment).sum(),
        total_estimated_return: history.iter().map(|run| run.total_estimated_return).sum(),
        module_analytics,
        unavailable_modules,
    }
}
