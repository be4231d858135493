//! Compliance gate report

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceCategory {
    Seo,
    Content,
    DataPrivacy,
    Advertising,
}

impl ComplianceCategory {
    pub const ALL: [ComplianceCategory; 4] = [
        ComplianceCategory::Seo,
        ComplianceCategory::Content,
        ComplianceCategory::DataPrivacy,
        ComplianceCategory::Advertising,
    ];
}

impl fmt::Display for ComplianceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceCategory::Seo => write!(f, "seo"),
            ComplianceCategory::Content => write!(f, "content"),
            ComplianceCategory::DataPrivacy => write!(f, "data_privacy"),
            ComplianceCategory::Advertising => write!(f, "advertising"),
        }
    }
}

/// Result of scoring a strategy against policy before execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub category_scores: BTreeMap<ComplianceCategory, f64>,
    pub overall_score: f64,
    pub warnings: Vec<String>,
    pub blockers: Vec<String>,
}

impl ComplianceReport {
    /// Build a report whose overall score is the mean of the category scores
    pub fn from_scores(category_scores: BTreeMap<ComplianceCategory, f64>) -> Self {
        let overall_score = if category_scores.is_empty() {
            0.0
        } else {
            category_scores.values().sum::<f64>() / category_scores.len() as f64
        };

        Self {
            category_scores,
            overall_score,
            warnings: Vec::new(),
            blockers: Vec::new(),
        }
    }

    /// Blockers are the only thing that halts a run
    pub fn is_blocked(&self) -> bool {
        !self.blockers.is_empty()
    }

    pub fn score(&self, category: ComplianceCategory) -> Option<f64> {
        self.category_scores.get(&category).copied()
    }
}
