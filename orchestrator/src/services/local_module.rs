//! In-process growth module adapter
//!
//! Produces a deterministic report from the strategy weights so the engine can
//! run end to end without external channel integrations. Results are cached per
//! `(vertical, run_id)` so a repeated invocation has no additional effect.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::{
    component_debug, component_info, ComponentId, ModuleAnalytics, ModuleKind, ModulePayload, ModuleReport,
    ModuleWeights, RunContext, Timeframe, Vertical,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::GrowthModule;

/// Spend per unit of priority, and the strategy parameter each module scales by
fn profile(kind: ModuleKind) -> (f64, &'static str, f64) {
    match kind {
        ModuleKind::Seo => (500.0, "keyword_depth", 40.0),
        ModuleKind::Content => (800.0, "publish_cadence", 4.0),
        ModuleKind::Referral => (300.0, "reward_multiplier", 1.0),
        ModuleKind::Backlink => (400.0, "outreach_volume", 25.0),
        ModuleKind::Social => (350.0, "post_frequency", 10.0),
        ModuleKind::Email => (200.0, "send_volume", 5000.0),
        ModuleKind::Conversion => (600.0, "experiment_count", 3.0),
    }
}

fn units(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    vertical: Vertical,
    recorded_at: DateTime<Utc>,
    report: ModuleReport,
}

pub struct LocalGrowthModule {
    kind: ModuleKind,
    initialized: AtomicBool,
    /// History and cached reports older than this are dropped on each run
    retention: Duration,
    history: Mutex<Vec<HistoryEntry>>,
    cache: Mutex<HashMap<(Vertical, Uuid), (DateTime<Utc>, ModuleReport)>>,
}

impl LocalGrowthModule {
    pub fn new(kind: ModuleKind) -> Self {
        Self {
            kind,
            initialized: AtomicBool::new(false),
            retention: Duration::days(365),
            history: Mutex::new(Vec::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Deterministic report for the given weights
    pub fn plan(&self, weights: &ModuleWeights) -> ModuleReport {
        let (budget, param, baseline) = profile(self.kind);
        let priority = weights.priority;
        let confidence = weights.confidence;
        let volume = weights.param(param).unwrap_or(baseline) * priority;

        let payload = match self.kind {
            ModuleKind::Seo => ModulePayload::Seo {
                pages_optimized: units(priority * 10.0),
                keywords_targeted: units(volume),
            },
            ModuleKind::Content => ModulePayload::Content {
                pieces_published: units(volume),
                average_quality: confidence,
            },
            ModuleKind::Referral => {
                let invites = units(100.0 * volume);
                ModulePayload::Referral {
                    invites_sent: invites,
                    rewards_issued: units(invites as f64 * confidence * 0.1),
                }
            }
            ModuleKind::Backlink => {
                let prospects = units(volume);
                ModulePayload::Backlink {
                    prospects_contacted: prospects,
                    links_acquired: units(prospects as f64 * confidence * 0.2),
                }
            }
            ModuleKind::Social => {
                let posts = units(volume);
                ModulePayload::Social {
                    posts_scheduled: posts,
                    projected_reach: (posts as f64 * 1000.0 * confidence).round() as u64,
                }
            }
            ModuleKind::Email => ModulePayload::Email {
                emails_sent: units(volume),
                projected_open_rate: 0.2 * confidence,
            },
            ModuleKind::Conversion => ModulePayload::Conversion {
                experiments_launched: units(volume),
                projected_lift: 0.05 * confidence * priority,
            },
        };

        let investment = budget * priority;
        ModuleReport {
            payload,
            investment,
            estimated_return: investment * (1.0 + confidence),
            performance: confidence * (0.5 + priority / 2.0),
        }
        .sanitized()
    }
}

#[async_trait]
impl GrowthModule for LocalGrowthModule {
    async fn initialize(&self) -> OrchestratorResult<()> {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            component_info!(ComponentId::Module(self.kind), "🔌 Local adapter initialized");
        }
        Ok(())
    }

    async fn run(&self, context: &RunContext, weights: &ModuleWeights) -> OrchestratorResult<ModuleReport> {
        if !self.is_initialized() {
            return Err(OrchestratorError::ModuleExecutionFailure {
                module: self.kind,
                reason: "adapter not initialized".to_string(),
            });
        }

        let now = Utc::now();
        let cutoff = now - self.retention;
        let key = (context.vertical.clone(), context.run_id);
        let mut cache = self.cache.lock().await;
        cache.retain(|_, (recorded_at, _)| *recorded_at >= cutoff);
        if let Some((_, report)) = cache.get(&key) {
            component_debug!(
                ComponentId::Module(self.kind),
                "♻️ Run {} already executed, returning cached report",
                context.run_id
            );
            return Ok(report.clone());
        }

        let report = self.plan(weights);
        cache.insert(key, (now, report.clone()));
        drop(cache);

        let mut history = self.history.lock().await;
        history.retain(|entry| entry.recorded_at >= cutoff);
        history.push(HistoryEntry {
            vertical: context.vertical.clone(),
            recorded_at: now,
            report: report.clone(),
        });

        Ok(report)
    }

    async fn get_analytics(&self, vertical: Option<Vertical>, timeframe: Timeframe) -> OrchestratorResult<ModuleAnalytics> {
        let since = timeframe.since(Utc::now());
        let history = self.history.lock().await;

        let mut analytics = ModuleAnalytics::default();
        let mut performance_sum = 0.0;
        for entry in history
            .iter()
            .filter(|entry| entry.recorded_at >= since)
            .filter(|entry| vertical.as_ref().map_or(true, |v| &entry.vertical == v))
        {
            analytics.runs += 1;
            analytics.successes += 1;
            analytics.total_investment += entry.report.investment;
            analytics.total_return += entry.report.estimated_return;
            performance_sum += entry.report.performance;
        }
        if analytics.runs > 0 {
            analytics.average_performance = performance_sum / analytics.runs as f64;
        }

        Ok(analytics)
    }

    async fn health_check(&self) -> Option<bool> {
        Some(self.is_initialized())
    }
}
