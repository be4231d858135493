//! Per-run optimization strategy handed to every module

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ModuleKind, Vertical};

/// Weighting record for one module within a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleWeights {
    /// Relative effort to spend on the module (0.0-1.0)
    pub priority: f64,
    /// Confidence that the module will pay off (0.0-1.0)
    pub confidence: f64,
    /// Module-specific tuning parameters
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ModuleWeights {
    pub fn new(priority: f64, confidence: f64) -> Self {
        Self {
            priority: priority.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// Weights used when nothing better is known
    pub fn conservative() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Where a strategy came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySource {
    Generated { table_version: u32 },
    ConservativeDefault,
}

/// Module weighting for a single run. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStrategy {
    pub vertical: Vertical,
    pub weights: BTreeMap<ModuleKind, ModuleWeights>,
    pub confidence_score: f64,
    pub estimated_lift: f64,
    pub source: StrategySource,
}

impl OptimizationStrategy {
    /// Fixed fallback used when strategy generation fails
    pub fn conservative_default(vertical: Vertical) -> Self {
        let weights = ModuleKind::ALL
            .into_iter()
            .map(|kind| (kind, ModuleWeights::conservative()))
            .collect();

        Self {
            vertical,
            weights,
            confidence_score: 0.5,
            estimated_lift: 0.0,
            source: StrategySource::ConservativeDefault,
        }
    }

    /// Weights for a module, conservative weights if the strategy omits it
    pub fn weights_for(&self, module: ModuleKind) -> ModuleWeights {
        self.weights
            .get(&module)
            .cloned()
            .unwrap_or_else(ModuleWeights::conservative)
    }

    pub fn is_default(&self) -> bool {
        self.source == StrategySource::ConservativeDefault
    }
}
