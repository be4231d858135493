//! Main entry point for the growth orchestrator binary
//!
//! Composition root: wires the local module adapters, heuristic strategy
//! generator, policy compliance validator and JSONL run sink into the
//! orchestrator, then runs the scheduler and health monitor until Ctrl+C.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use growth_orchestrator::{
    AnalyticsRecorder, EngineConfig, GrowthOrchestrator, HeuristicStrategyGenerator, JsonlRunSink, LocalGrowthModule,
    ModuleRegistry, OrchestratorError, OrchestratorResult, PolicyComplianceValidator, RunScheduler,
};
use shared::{component_info, component_warn, logging, ComponentId, ModuleKind, Vertical};

/// Growth orchestration engine
#[derive(Parser)]
#[command(name = "growth-orchestrator")]
#[command(about = "Runs scheduled growth optimization cycles across seven growth modules")]
pub struct Args {
    /// Vertical to optimize (repeatable)
    #[arg(long = "vertical", required = true)]
    pub verticals: Vec<String>,

    /// Run each vertical once and exit
    #[arg(long)]
    pub once: bool,

    /// Directory for the append-only run and module metric files
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Tracing endpoint URL
    #[arg(long)]
    pub trace_ep: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Override the base delay between runs of one vertical
    #[arg(long)]
    pub base_interval_secs: Option<u64>,

    /// Override the per-module call timeout
    #[arg(long)]
    pub module_timeout_secs: Option<u64>,
}

impl Args {
    fn engine_config(&self) -> OrchestratorResult<EngineConfig> {
        let mut config = EngineConfig::from_env()?;
        if let Some(secs) = self.base_interval_secs {
            config.base_run_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.module_timeout_secs {
            config.module_timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    fn verticals(&self) -> OrchestratorResult<Vec<Vertical>> {
        let mut verticals = Vec::new();
        for name in &self.verticals {
            let vertical = Vertical::new(name)?;
            if !verticals.contains(&vertical) {
                verticals.push(vertical);
            }
        }
        if verticals.is_empty() {
            return Err(OrchestratorError::config("at least one --vertical is required"));
        }
        Ok(verticals)
    }
}

#[tokio::main]
async fn main() -> OrchestratorResult<()> {
    let args = Args::parse();

    let trace_endpoint = args
        .trace_ep
        .as_ref()
        .map(|url| logging::TracingEndpoint::new(url.clone()));
    logging::init_tracing_with_endpoint_and_level(trace_endpoint, Some(&args.log_level));

    let config = args.engine_config()?;
    let verticals = args.verticals()?;
    logging::log_startup(
        ComponentId::Orchestrator,
        &format!("growth orchestrator for {} verticals", verticals.len()),
    );

    // Initialize services
    let registry = ModuleKind::ALL.into_iter().fold(ModuleRegistry::new(), |registry, kind| {
        registry.with_module(kind, Arc::new(LocalGrowthModule::new(kind)))
    });
    let sink = Arc::new(JsonlRunSink::with_base_dir(args.data_dir.clone()));
    let recorder = Arc::new(AnalyticsRecorder::new(sink, config.metrics_capacity));

    // Create orchestrator with dependency injection
    let orchestrator = Arc::new(GrowthOrchestrator::new(
        registry,
        HeuristicStrategyGenerator::new(),
        PolicyComplianceValidator::new(),
        recorder,
        config,
    ));
    orchestrator.initialize_modules().await;

    let scheduler = Arc::new(RunScheduler::new(Arc::clone(&orchestrator), verticals));

    if args.once {
        for (vertical, outcome) in scheduler.run_once().await {
            match outcome {
                Ok(run) => component_info!(
                    ComponentId::Orchestrator,
                    "📈 '{}': {:?}, {} ok / {} failed, ROI {:.2}",
                    vertical,
                    run.status,
                    run.success_count,
                    run.failure_count,
                    run.estimated_roi
                ),
                Err(e) => logging::log_error(ComponentId::Orchestrator, &format!("Run for '{}'", vertical), &e),
            }
        }
        let health = orchestrator.get_system_health().await;
        for recommendation in &health.recommendations {
            component_info!(ComponentId::HealthMonitor, "💡 {}", recommendation);
        }
        return Ok(());
    }

    // Set up graceful shutdown
    let cancel = CancellationToken::new();
    let health_task = orchestrator.health_monitor().spawn(cancel.clone());
    let scheduler_task = Arc::clone(&scheduler).spawn(cancel.clone());

    match signal::ctrl_c().await {
        Ok(()) => logging::log_shutdown(ComponentId::Orchestrator, "Received Ctrl+C signal"),
        Err(err) => logging::log_error(ComponentId::Orchestrator, "Signal handling", &err),
    }
    cancel.cancel();

    for (name, task) in [("health monitor", health_task), ("scheduler", scheduler_task)] {
        if let Err(e) = task.await {
            component_warn!(ComponentId::Orchestrator, "⚠️ {} task ended abnormally: {}", name, e);
        }
    }

    logging::log_success(ComponentId::Orchestrator, "Growth orchestrator stopped gracefully");
    Ok(())
}
