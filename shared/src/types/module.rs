//! Module execution results and analytics

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{ModuleKind, Vertical};

/// Identifies one module invocation so adapters can make side effects idempotent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: Uuid,
    pub vertical: Vertical,
}

/// Category-specific output of a successful module run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "lowercase")]
pub enum ModulePayload {
    Seo {
        pages_optimized: u32,
        keywords_targeted: u32,
    },
    Content {
        pieces_published: u32,
        average_quality: f64,
    },
    Referral {
        invites_sent: u32,
        rewards_issued: u32,
    },
    Backlink {
        prospects_contacted: u32,
        links_acquired: u32,
    },
    Social {
        posts_scheduled: u32,
        projected_reach: u64,
    },
    Email {
        emails_sent: u32,
        projected_open_rate: f64,
    },
    Conversion {
        experiments_launched: u32,
        projected_lift: f64,
    },
}

impl ModulePayload {
    pub fn module(&self) -> ModuleKind {
        match self {
            ModulePayload::Seo { .. } => ModuleKind::Seo,
            ModulePayload::Content { .. } => ModuleKind::Content,
            ModulePayload::Referral { .. } => ModuleKind::Referral,
            ModulePayload::Backlink { .. } => ModuleKind::Backlink,
            ModulePayload::Social { .. } => ModuleKind::Social,
            ModulePayload::Email { .. } => ModuleKind::Email,
            ModulePayload::Conversion { .. } => ModuleKind::Conversion,
        }
    }
}

/// Success content returned by a module adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub payload: ModulePayload,
    /// Spend committed by this run (currency units, >= 0)
    pub investment: f64,
    /// Expected return on `investment` (currency units, >= 0)
    pub estimated_return: f64,
    /// Self-assessed performance (0.0-1.0)
    pub performance: f64,
}

impl ModuleReport {
    /// Clamp adapter-supplied numbers into their documented ranges.
    /// Non-finite values collapse to zero.
    pub fn sanitized(mut self) -> Self {
        self.investment = finite_non_negative(self.investment);
        self.estimated_return = finite_non_negative(self.estimated_return);
        self.performance = if self.performance.is_finite() {
            self.performance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

fn finite_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Why a module result counts as a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotInitialized,
    Execution,
    Timeout,
    Panicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotInitialized => write!(f, "not_initialized"),
            FailureKind::Execution => write!(f, "execution"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Panicked => write!(f, "panicked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModuleOutcome {
    Completed(ModuleReport),
    Failed(ModuleFailure),
}

/// Per-module outcome of one run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub module: ModuleKind,
    pub outcome: ModuleOutcome,
}

impl ModuleResult {
    pub fn completed(module: ModuleKind, report: ModuleReport) -> Self {
        Self {
            module,
            outcome: ModuleOutcome::Completed(report.sanitized()),
        }
    }

    pub fn failed(module: ModuleKind, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            module,
            outcome: ModuleOutcome::Failed(ModuleFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ModuleOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&ModuleReport> {
        match &self.outcome {
            ModuleOutcome::Completed(report) => Some(report),
            ModuleOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ModuleFailure> {
        match &self.outcome {
            ModuleOutcome::Completed(_) => None,
            ModuleOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Read-only analytics a module reports about its own history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModuleAnalytics {
    pub runs: u64,
    pub successes: u64,
    pub total_investment: f64,
    pub total_return: f64,
    pub average_performance: f64,
}
