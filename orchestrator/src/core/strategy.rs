//! Heuristic strategy generation
//!
//! Strategies are a pure function of the vertical and the static tables below.
//! Bump `TABLE_VERSION` whenever a table changes so recorded runs stay auditable.

use async_trait::async_trait;
use shared::{ModuleKind, ModuleWeights, OptimizationStrategy, StrategySource, Vertical};
use std::collections::BTreeMap;

use crate::error::OrchestratorResult;
use crate::traits::StrategyGenerator;

pub const TABLE_VERSION: u32 = 3;

/// Fraction of lift expected per unit of priority-weighted confidence
const LIFT_PER_UNIT: f64 = 0.05;

/// Baseline weighting for one module before vertical adjustment
struct ModuleBaseline {
    kind: ModuleKind,
    priority: f64,
    confidence: f64,
    param: &'static str,
    param_value: f64,
}

const BASELINES: [ModuleBaseline; 7] = [
    ModuleBaseline { kind: ModuleKind::Seo, priority: 0.7, confidence: 0.8, param: "keyword_depth", param_value: 40.0 },
    ModuleBaseline { kind: ModuleKind::Content, priority: 0.7, confidence: 0.75, param: "publish_cadence", param_value: 4.0 },
    ModuleBaseline { kind: ModuleKind::Referral, priority: 0.5, confidence: 0.6, param: "reward_multiplier", param_value: 1.0 },
    ModuleBaseline { kind: ModuleKind::Backlink, priority: 0.5, confidence: 0.55, param: "outreach_volume", param_value: 25.0 },
    ModuleBaseline { kind: ModuleKind::Social, priority: 0.6, confidence: 0.6, param: "post_frequency", param_value: 10.0 },
    ModuleBaseline { kind: ModuleKind::Email, priority: 0.6, confidence: 0.7, param: "send_volume", param_value: 5000.0 },
    ModuleBaseline { kind: ModuleKind::Conversion, priority: 0.6, confidence: 0.65, param: "experiment_count", param_value: 3.0 },
];

/// Per-vertical multipliers in `ModuleKind::ALL` order
const VERTICAL_MULTIPLIERS: [(&str, [f64; 7]); 8] = [
    ("finance", [1.1, 1.2, 0.9, 0.8, 0.9, 0.8, 1.1]),
    ("health", [1.2, 1.3, 0.8, 0.7, 0.8, 0.7, 0.9]),
    ("ecommerce", [1.2, 0.9, 1.2, 0.9, 1.3, 1.3, 1.4]),
    ("saas", [1.1, 1.3, 1.3, 1.0, 0.9, 1.1, 1.2]),
    ("education", [1.0, 1.3, 1.1, 0.9, 1.0, 1.0, 0.9]),
    ("travel", [1.1, 1.1, 1.0, 0.9, 1.3, 1.2, 1.0]),
    ("real_estate", [1.2, 0.9, 1.2, 0.8, 1.1, 1.0, 1.0]),
    ("gaming", [0.8, 1.1, 1.4, 0.7, 1.4, 0.8, 1.1]),
];

/// Multiplier for `module` in `vertical`, 1.0 for anything not in the table
pub fn vertical_multiplier(vertical: &Vertical, module: ModuleKind) -> f64 {
    let index = ModuleKind::ALL
        .iter()
        .position(|kind| *kind == module)
        .unwrap_or(0);

    VERTICAL_MULTIPLIERS
        .iter()
        .find(|(name, _)| *name == vertical.as_str())
        .map(|(_, multipliers)| multipliers[index])
        .unwrap_or(1.0)
}

/// Deterministic table-driven strategy generator
#[derive(Debug, Clone, Default)]
pub struct HeuristicStrategyGenerator;

impl HeuristicStrategyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the strategy for `vertical` from the static tables
    pub fn strategy_for(&self, vertical: &Vertical) -> OptimizationStrategy {
        let weights: BTreeMap<ModuleKind, ModuleWeights> = BASELINES
            .iter()
            .map(|baseline| {
                let multiplier = vertical_multiplier(vertical, baseline.kind);
                let weights = ModuleWeights::new(baseline.priority * multiplier, baseline.confidence)
                    .with_param("multiplier", multiplier)
                    .with_param(baseline.param, baseline.param_value * multiplier);
                (baseline.kind, weights)
            })
            .collect();

        let weighted: f64 = weights.values().map(|w| w.priority * w.confidence).sum();
        let total_priority: f64 = weights.values().map(|w| w.priority).sum();
        let confidence_score = if total_priority > 0.0 {
            weighted / total_priority
        } else {
            0.0
        };

        OptimizationStrategy {
            vertical: vertical.clone(),
            weights,
            confidence_score,
            estimated_lift: weighted * LIFT_PER_UNIT,
            source: StrategySource::Generated {
                table_version: TABLE_VERSION,
            },
        }
    }
}

#[async_trait]
impl StrategyGenerator for HeuristicStrategyGenerator {
    async fn generate(&self, vertical: &Vertical) -> OrchestratorResult<OptimizationStrategy> {
        Ok(self.strategy_for(vertical))
    }
}
