//! Policy-based compliance scoring
//!
//! Each category starts at 1.0 and loses points for module priorities above
//! policy limits. Regulated verticals pay a flat surcharge per category and
//! face a stricter data-privacy floor.

use async_trait::async_trait;
use shared::{ComplianceCategory, ComplianceReport, ModuleKind, OptimizationStrategy, Vertical};
use std::collections::BTreeMap;

use crate::error::OrchestratorResult;
use crate::traits::ComplianceValidator;

/// Penalise a category when a module's priority exceeds `limit`.
/// The penalty grows linearly from 0 at `limit` to `weight` at priority 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityRule {
    pub category: ComplianceCategory,
    pub module: ModuleKind,
    pub limit: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompliancePolicy {
    pub rules: Vec<PriorityRule>,
    /// Verticals subject to financial/health style regulation
    pub regulated_verticals: Vec<String>,
    /// Flat per-category penalty applied to regulated verticals
    pub regulated_surcharge: BTreeMap<ComplianceCategory, f64>,
    /// Overall score below this adds a warning
    pub warning_threshold: f64,
    /// Any category below this blocks the run
    pub category_floor: f64,
    /// Data-privacy score below this blocks runs in regulated verticals
    pub regulated_privacy_floor: f64,
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        use ComplianceCategory::*;

        let rule = |category, module, limit, weight| PriorityRule {
            category,
            module,
            limit,
            weight,
        };

        Self {
            rules: vec![
                rule(Seo, ModuleKind::Backlink, 0.7, 0.5),
                rule(Seo, ModuleKind::Seo, 0.85, 0.3),
                rule(Content, ModuleKind::Content, 0.8, 0.4),
                rule(DataPrivacy, ModuleKind::Email, 0.6, 0.4),
                rule(DataPrivacy, ModuleKind::Referral, 0.6, 0.3),
                rule(DataPrivacy, ModuleKind::Conversion, 0.7, 0.3),
                rule(Advertising, ModuleKind::Social, 0.7, 0.4),
                rule(Advertising, ModuleKind::Referral, 0.7, 0.2),
            ],
            regulated_verticals: ["finance", "health", "healthcare", "insurance", "legal"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
            regulated_surcharge: BTreeMap::from([
                (Content, 0.1),
                (DataPrivacy, 0.15),
                (Advertising, 0.1),
            ]),
            warning_threshold: 0.7,
            category_floor: 0.2,
            regulated_privacy_floor: 0.5,
        }
    }
}

impl CompliancePolicy {
    pub fn is_regulated(&self, vertical: &Vertical) -> bool {
        self.regulated_verticals
            .iter()
            .any(|name| name == vertical.as_str())
    }

    /// Score a strategy. Pure and deterministic.
    pub fn evaluate(&self, vertical: &Vertical, strategy: &OptimizationStrategy) -> ComplianceReport {
        let regulated = self.is_regulated(vertical);

        let mut scores: BTreeMap<ComplianceCategory, f64> =
            ComplianceCategory::ALL.into_iter().map(|c| (c, 1.0)).collect();
        let mut warnings = Vec::new();

        for rule in &self.rules {
            let priority = strategy.weights_for(rule.module).priority;
            let excess = excess_ratio(priority, rule.limit);
            if excess > 0.0 {
                if let Some(score) = scores.get_mut(&rule.category) {
                    *score -= rule.weight * excess;
                }
                warnings.push(format!(
                    "{} priority {:.2} exceeds {} limit {:.2}",
                    rule.module, priority, rule.category, rule.limit
                ));
            }
        }

        if regulated {
            for (category, surcharge) in &self.regulated_surcharge {
                if let Some(score) = scores.get_mut(category) {
                    *score -= surcharge;
                }
            }
        }

        for score in scores.values_mut() {
            *score = score.clamp(0.0, 1.0);
        }

        let mut report = ComplianceReport::from_scores(scores);
        report.warnings = warnings;

        if report.overall_score < self.warning_threshold {
            report.warnings.push(format!(
                "overall compliance score {:.2} below {:.2}",
                report.overall_score, self.warning_threshold
            ));
        }

        for (category, score) in &report.category_scores {
            if *score < self.category_floor {
                report.blockers.push(format!(
                    "{category} score {score:.2} below hard floor {:.2}",
                    self.category_floor
                ));
            } else if regulated
                && *category == ComplianceCategory::DataPrivacy
                && *score < self.regulated_privacy_floor
            {
                report.blockers.push(format!(
                    "data_privacy score {score:.2} below regulated floor {:.2} for {vertical}",
                    self.regulated_privacy_floor
                ));
            }
        }

        report
    }
}

/// Share of the headroom above `limit` that `priority` uses. A non-finite
/// priority counts as full excess.
fn excess_ratio(priority: f64, limit: f64) -> f64 {
    if !priority.is_finite() {
        return 1.0;
    }
    if priority <= limit || limit >= 1.0 {
        return 0.0;
    }
    ((priority - limit) / (1.0 - limit)).clamp(0.0, 1.0)
}

/// Static-policy compliance gate
#[derive(Debug, Clone, Default)]
pub struct PolicyComplianceValidator {
    policy: CompliancePolicy,
}

impl PolicyComplianceValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CompliancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CompliancePolicy {
        &self.policy
    }
}

#[async_trait]
impl ComplianceValidator for PolicyComplianceValidator {
    async fn validate(&self, vertical: &Vertical, strategy: &OptimizationStrategy) -> OrchestratorResult<ComplianceReport> {
        Ok(self.policy.evaluate(vertical, strategy))
    }
}
