//! Test fixtures and data for orchestrator tests
//!
//! Consistent test data used across all test suites.

use shared::{
    ComplianceCategory, ComplianceReport, ModuleKind, ModulePayload, ModuleReport, OptimizationStrategy, Vertical,
};
use std::time::Duration;

use growth_orchestrator::EngineConfig;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SAAS: &'static str = "saas";
    pub const FINANCE: &'static str = "finance";
    pub const TRAVEL: &'static str = "travel";

    /// Base run interval used by test configs
    pub const BASE_INTERVAL_SECS: u64 = 1000;
    pub const MODULE_TIMEOUT_MS: u64 = 100;

    pub fn vertical(name: &str) -> Vertical {
        Vertical::new(name).unwrap()
    }

    pub fn config() -> EngineConfig {
        EngineConfig {
            base_run_interval: Duration::from_secs(Self::BASE_INTERVAL_SECS),
            module_timeout: Duration::from_millis(Self::MODULE_TIMEOUT_MS),
            min_health_check_interval: Duration::ZERO,
            ..EngineConfig::default()
        }
    }

    /// Smallest payload of the right shape for `kind`
    pub fn payload(kind: ModuleKind) -> ModulePayload {
        match kind {
            ModuleKind::Seo => ModulePayload::Seo {
                pages_optimized: 4,
                keywords_targeted: 20,
            },
            ModuleKind::Content => ModulePayload::Content {
                pieces_published: 2,
                average_quality: 0.8,
            },
            ModuleKind::Referral => ModulePayload::Referral {
                invites_sent: 50,
                rewards_issued: 5,
            },
            ModuleKind::Backlink => ModulePayload::Backlink {
                prospects_contacted: 10,
                links_acquired: 2,
            },
            ModuleKind::Social => ModulePayload::Social {
                posts_scheduled: 6,
                projected_reach: 4200,
            },
            ModuleKind::Email => ModulePayload::Email {
                emails_sent: 1000,
                projected_open_rate: 0.21,
            },
            ModuleKind::Conversion => ModulePayload::Conversion {
                experiments_launched: 1,
                projected_lift: 0.03,
            },
        }
    }

    pub fn report(kind: ModuleKind, investment: f64, estimated_return: f64, performance: f64) -> ModuleReport {
        ModuleReport {
            payload: Self::payload(kind),
            investment,
            estimated_return,
            performance,
        }
    }

    pub fn passing_compliance() -> ComplianceReport {
        ComplianceReport::from_scores(ComplianceCategory::ALL.into_iter().map(|c| (c, 0.95)).collect())
    }

    pub fn blocking_compliance() -> ComplianceReport {
        let mut report = ComplianceReport::from_scores(
            ComplianceCategory::ALL
                .into_iter()
                .map(|c| (c, if c == ComplianceCategory::DataPrivacy { 0.1 } else { 0.9 }))
                .collect(),
        );
        report
            .blockers
            .push("data_privacy score 0.10 is below the floor 0.20".to_string());
        report
    }

    /// Conservative strategy with an explicit confidence score
    pub fn strategy_with_confidence(vertical: &str, confidence_score: f64) -> OptimizationStrategy {
        let mut strategy = OptimizationStrategy::conservative_default(Self::vertical(vertical));
        strategy.confidence_score = confidence_score;
        strategy
    }
}
