//! Service-specific tests
//!
//! Each service has its own test file; shared builders live in `common`.

#[cfg(test)]
mod local_module;

// Common test utilities for services
#[cfg(test)]
pub mod common {
    use chrono::{DateTime, Duration, Utc};
    use shared::{
        ComplianceCategory, ComplianceReport, FailureKind, ModuleKind, ModulePayload, ModuleReport, ModuleResult,
        OptimizationRun, OptimizationStrategy, RunStatus, Vertical,
    };
    use uuid::Uuid;

    pub fn vertical(name: &str) -> Vertical {
        Vertical::new(name).expect("valid test vertical")
    }

    pub fn passing_compliance() -> ComplianceReport {
        ComplianceReport::from_scores(ComplianceCategory::ALL.into_iter().map(|c| (c, 0.9)).collect())
    }

    pub fn report(investment: f64, estimated_return: f64, performance: f64) -> ModuleReport {
        ModuleReport {
            payload: ModulePayload::Seo {
                pages_optimized: 3,
                keywords_targeted: 12,
            },
            investment,
            estimated_return,
            performance,
        }
    }

    /// Completed run with one failed module and six successes
    pub fn sample_run(name: &str, finished_at: DateTime<Utc>) -> OptimizationRun {
        let results: Vec<ModuleResult> = ModuleKind::ALL
            .into_iter()
            .map(|kind| {
                if kind == ModuleKind::Email {
                    ModuleResult::failed(kind, FailureKind::Execution, "smtp unavailable")
                } else {
                    ModuleResult::completed(kind, report(100.0, 150.0, 0.7))
                }
            })
            .collect();

        OptimizationRun {
            run_id: Uuid::new_v4(),
            vertical: vertical(name),
            status: RunStatus::Completed,
            started_at: finished_at - Duration::seconds(2),
            finished_at,
            strategy: OptimizationStrategy::conservative_default(vertical(name)),
            compliance: passing_compliance(),
            results,
            success_count: 6,
            failure_count: 1,
            estimated_roi: 4.5,
            average_performance: 0.7,
            next_run_at: finished_at + Duration::hours(1),
        }
    }
}
