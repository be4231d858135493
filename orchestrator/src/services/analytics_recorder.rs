//! Analytics recorder
//!
//! Keeps a bounded FIFO buffer of recent performance samples and forwards a
//! compact run summary plus per-module metric rows to the durable sink.

use chrono::{DateTime, Utc};
use shared::{component_debug, ComponentId, OptimizationRun, PerformanceSample, RunSummary, Vertical};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::OrchestratorResult;
use crate::traits::RunSink;

pub struct AnalyticsRecorder {
    sink: Arc<dyn RunSink>,
    recent: Mutex<VecDeque<PerformanceSample>>,
    capacity: usize,
}

impl AnalyticsRecorder {
    pub fn new(sink: Arc<dyn RunSink>, capacity: usize) -> Self {
        Self {
            sink,
            recent: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    /// Record a finished run. The in-memory sample is kept even when the sink
    /// write fails; the error is returned for the caller to log.
    pub async fn record(&self, run: &OptimizationRun) -> OrchestratorResult<()> {
        self.push_sample(PerformanceSample {
            run_id: run.run_id,
            vertical: run.vertical.clone(),
            recorded_at: run.finished_at,
            status: run.status,
            success_count: run.success_count,
            failure_count: run.failure_count,
            estimated_roi: run.estimated_roi,
            average_performance: run.average_performance,
            compliance_score: run.compliance.overall_score,
        })
        .await;

        self.sink.append_run(&run.summary()).await?;
        self.sink.append_module_metrics(&run.module_metrics()).await?;

        component_debug!(
            ComponentId::Recorder,
            "📊 Recorded run {} for '{}' ({} ok / {} failed)",
            run.run_id,
            run.vertical,
            run.success_count,
            run.failure_count
        );
        Ok(())
    }

    async fn push_sample(&self, sample: PerformanceSample) {
        let mut recent = self.recent.lock().await;
        // Oldest collected sample goes first regardless of how often it was read
        while recent.len() >= self.capacity {
            recent.pop_front();
        }
        recent.push_back(sample);
    }

    /// Recent samples, oldest first
    pub async fn recent_samples(&self) -> Vec<PerformanceSample> {
        self.recent.lock().await.iter().cloned().collect()
    }

    /// Durable history for a vertical (or all) since `since`
    pub async fn history(&self, vertical: Option<&Vertical>, since: DateTime<Utc>) -> OrchestratorResult<Vec<RunSummary>> {
        self.sink.load_runs(vertical.cloned(), since).await
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
