//! Tests for the in-process module adapter

use shared::{ModuleKind, ModuleWeights, RunContext, Timeframe};
use uuid::Uuid;

use super::common::vertical;
use crate::error::OrchestratorError;
use crate::services::local_module::LocalGrowthModule;
use crate::traits::GrowthModule;

fn context(name: &str) -> RunContext {
    RunContext {
        run_id: Uuid::new_v4(),
        vertical: vertical(name),
    }
}

#[tokio::test]
async fn test_run_requires_initialization() {
    let module = LocalGrowthModule::new(ModuleKind::Seo);
    let result = module.run(&context("saas"), &ModuleWeights::conservative()).await;
    assert!(matches!(result, Err(OrchestratorError::ModuleExecutionFailure { .. })));
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let module = LocalGrowthModule::new(ModuleKind::Email);
    assert_eq!(module.health_check().await, Some(false));

    module.initialize().await.unwrap();
    module.initialize().await.unwrap();

    assert!(module.is_initialized());
    assert_eq!(module.health_check().await, Some(true));
}

#[tokio::test]
async fn test_repeated_run_returns_cached_report() {
    let module = LocalGrowthModule::new(ModuleKind::Social);
    module.initialize().await.unwrap();
    let ctx = context("travel");
    let weights = ModuleWeights::new(0.8, 0.6).with_param("post_frequency", 10.0);

    let first = module.run(&ctx, &weights).await.unwrap();
    let second = module.run(&ctx, &ModuleWeights::conservative()).await.unwrap();

    assert_eq!(first, second);
    let analytics = module.get_analytics(None, Timeframe::All).await.unwrap();
    assert_eq!(analytics.runs, 1);
}

#[test]
fn test_plan_is_deterministic_and_matches_kind() {
    let weights = ModuleWeights::new(0.7, 0.8);
    for kind in ModuleKind::ALL {
        let module = LocalGrowthModule::new(kind);
        let report = module.plan(&weights);

        assert_eq!(report, module.plan(&weights));
        assert_eq!(report.payload.module(), kind);
        assert!(report.investment > 0.0);
        assert!(report.estimated_return >= report.investment);
        assert!((0.0..=1.0).contains(&report.performance));
    }
}

#[tokio::test]
async fn test_analytics_filter_by_vertical() {
    let module = LocalGrowthModule::new(ModuleKind::Conversion);
    module.initialize().await.unwrap();
    let weights = ModuleWeights::conservative();

    module.run(&context("saas"), &weights).await.unwrap();
    module.run(&context("saas"), &weights).await.unwrap();
    module.run(&context("finance"), &weights).await.unwrap();

    let saas = module
        .get_analytics(Some(vertical("saas")), Timeframe::Day)
        .await
        .unwrap();
    let all = module.get_analytics(None, Timeframe::Day).await.unwrap();

    assert_eq!(saas.runs, 2);
    assert_eq!(saas.successes, 2);
    assert_eq!(all.runs, 3);
    assert!((all.total_investment - 3.0 * module.plan(&weights).investment).abs() < 1e-9);
}

#[tokio::test]
async fn test_run_drops_entries_past_retention() {
    let module = LocalGrowthModule::new(ModuleKind::Content).with_retention(chrono::Duration::milliseconds(200));
    module.initialize().await.unwrap();
    let weights = ModuleWeights::conservative();
    let old = context("saas");

    let first = module.run(&old, &weights).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    module.run(&context("saas"), &weights).await.unwrap();

    let analytics = module.get_analytics(None, Timeframe::All).await.unwrap();
    assert_eq!(analytics.runs, 1);

    // The expired cache entry is gone, so the old run executes again
    let again = module.run(&old, &weights).await.unwrap();
    assert_eq!(again, first);
    let analytics = module.get_analytics(None, Timeframe::All).await.unwrap();
    assert_eq!(analytics.runs, 2);
}
