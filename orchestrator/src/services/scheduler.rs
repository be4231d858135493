//! Run scheduler
//!
//! Drives `execute_growth_optimization` for a fixed list of verticals. Each
//! vertical sleeps until the `next_run_at` of its previous run, or for the
//! retry delay when the run failed, until cancelled.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use shared::{component_info, logging, ComponentId, OptimizationRun, Vertical};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::OrchestratorResult;
use crate::orchestrator::GrowthOrchestrator;
use crate::traits::{ComplianceValidator, StrategyGenerator};

/// Time left until `next_run_at`, zero when it already passed
pub fn delay_until(next_run_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (next_run_at - now).to_std().unwrap_or(Duration::ZERO)
}

pub struct RunScheduler<G, V>
where
    G: StrategyGenerator + 'static,
    V: ComplianceValidator + 'static,
{
    orchestrator: Arc<GrowthOrchestrator<G, V>>,
    verticals: Vec<Vertical>,
    retry_delay: Duration,
}

impl<G, V> RunScheduler<G, V>
where
    G: StrategyGenerator + 'static,
    V: ComplianceValidator + 'static,
{
    pub fn new(orchestrator: Arc<GrowthOrchestrator<G, V>>, verticals: Vec<Vertical>) -> Self {
        let retry_delay = orchestrator.config().retry_delay;
        Self {
            orchestrator,
            verticals,
            retry_delay,
        }
    }

    pub fn verticals(&self) -> &[Vertical] {
        &self.verticals
    }

    /// Run every vertical once, concurrently
    pub async fn run_once(&self) -> Vec<(Vertical, OrchestratorResult<OptimizationRun>)> {
        let runs = self.verticals.iter().map(|vertical| async move {
            (vertical.clone(), self.orchestrator.execute_growth_optimization(vertical).await)
        });
        join_all(runs).await
    }

    /// Delay before the next run of a vertical given the outcome of its last one
    pub fn next_delay(&self, outcome: &OrchestratorResult<OptimizationRun>, now: DateTime<Utc>) -> Duration {
        match outcome {
            Ok(run) => delay_until(run.next_run_at, now),
            Err(_) => self.retry_delay,
        }
    }

    async fn drive(&self, vertical: &Vertical, cancel: &CancellationToken) {
        while !cancel.is_cancelled() {
            let outcome = self.orchestrator.execute_growth_optimization(vertical).await;
            if let Err(e) = &outcome {
                logging::log_error(ComponentId::Scheduler, &format!("Scheduled run for '{}'", vertical), e);
            }
            let delay = self.next_delay(&outcome, Utc::now());

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Schedule every vertical until `cancel` fires
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            logging::log_startup(
                ComponentId::Scheduler,
                &format!("scheduler for {} verticals", self.verticals.len()),
            );
            join_all(self.verticals.iter().map(|vertical| self.drive(vertical, &cancel))).await;
            component_info!(ComponentId::Scheduler, "🛑 Scheduler stopped");
        })
    }
}
