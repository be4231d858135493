//! End-to-end tests for the growth orchestrator
//!
//! These tests drive `execute_growth_optimization`, analytics and health through
//! the public API with fake modules and mockall-generated collaborators.

use shared::{ComponentId, ErrorKind, FailureKind, ModuleKind, RunStatus, StrategySource, Timeframe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use growth_orchestrator::traits::MockRunSink;
use growth_orchestrator::{
    AnalyticsRecorder, EngineConfig, GrowthOrchestrator, HealthCheckOutcome, HealthTrigger, HeuristicStrategyGenerator,
    JsonlRunSink, LocalGrowthModule, ModuleRegistry, OrchestratorError, PolicyComplianceValidator, RunScheduler,
};

mod common;
use common::{Behavior, FakeModule, OrchestratorBuilder, TestFixtures, TestHelpers};

fn module_context(kind: ModuleKind) -> String {
    ComponentId::Module(kind).to_string()
}

/// A passing gate invokes every module once, in canonical order
#[tokio::test]
async fn test_successful_run_invokes_all_seven_modules() {
    let harness = OrchestratorBuilder::new().build();

    let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.success_count + run.failure_count, 7);
    assert_eq!(run.success_count, 7);
    assert_eq!(TestHelpers::result_modules(&run), ModuleKind::ALL.to_vec());
    assert!(run.finished_at >= run.started_at);
    assert_eq!(harness.sink.run_count().await, 1);
    assert_eq!(harness.sink.module_metrics().await.len(), 7);
}

#[tokio::test]
async fn test_blocked_run_invokes_no_modules() {
    let seo = Arc::new(FakeModule::succeeding(ModuleKind::Seo));
    let harness = OrchestratorBuilder::new()
        .with_module(ModuleKind::Seo, seo.clone())
        .with_compliance_validator(|validator| {
            validator
                .expect_validate()
                .returning(|_, _| Ok(TestFixtures::blocking_compliance()));
        })
        .build();

    let run = TestHelpers::run(&harness, TestFixtures::FINANCE).await;

    assert_eq!(run.status, RunStatus::ComplianceBlocked);
    assert!(run.results.is_empty());
    assert_eq!(run.success_count, 0);
    assert_eq!(run.failure_count, 0);
    assert_eq!(run.estimated_roi, 0.0);
    assert_eq!(seo.run_calls(), 0);
    // Blocked runs are recorded like any other
    assert_eq!(harness.sink.run_count().await, 1);
}

#[tokio::test]
async fn test_roi_formula_and_zero_investment() {
    let free = Arc::new(FakeModule::new(
        ModuleKind::Content,
        Behavior::Succeed {
            investment: 0.0,
            estimated_return: 500.0,
            performance: 0.8,
        },
    ));
    let harness = OrchestratorBuilder::new()
        .with_module(ModuleKind::Content, free)
        .with_strategy_generator(|generator| {
            generator
                .expect_generate()
                .returning(|_| Ok(TestFixtures::strategy_with_confidence(TestFixtures::SAAS, 0.5)));
        })
        .build();

    let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    // Six modules at 150 * 0.5 / 100 each; the zero-investment module adds nothing
    assert!((run.estimated_roi - 6.0 * 0.75).abs() < 1e-9);
    assert!(run.estimated_roi.is_finite());
}

#[tokio::test]
async fn test_all_zero_investment_gives_zero_roi() {
    let builder = ModuleKind::ALL.into_iter().fold(OrchestratorBuilder::new(), |builder, kind| {
        builder.with_module(
            kind,
            Arc::new(FakeModule::new(
                kind,
                Behavior::Succeed {
                    investment: 0.0,
                    estimated_return: 10.0,
                    performance: 0.5,
                },
            )),
        )
    });
    let harness = builder.build();

    let run = TestHelpers::run(&harness, TestFixtures::TRAVEL).await;
    assert_eq!(run.estimated_roi, 0.0);
}

#[tokio::test]
async fn test_one_failing_module_fails_alone_every_run() {
    let harness = TestHelpers::with_module(ModuleKind::Email, Arc::new(FakeModule::failing(ModuleKind::Email)));

    for _ in 0..3 {
        let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;
        assert_eq!(run.failure_count, 1);
        assert_eq!(run.success_count, 6);
        let failure = run.result_for(ModuleKind::Email).and_then(|r| r.failure()).unwrap();
        assert_eq!(failure.kind, FailureKind::Execution);
    }

    let count = harness
        .orchestrator
        .error_count(&module_context(ModuleKind::Email), ErrorKind::ModuleExecution)
        .await;
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_timed_out_module_does_not_block_siblings() {
    let harness = TestHelpers::with_module(
        ModuleKind::Social,
        Arc::new(FakeModule::new(ModuleKind::Social, Behavior::Hang)),
    );

    let started = Instant::now();
    let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(run.success_count, 6);
    let failure = run.result_for(ModuleKind::Social).and_then(|r| r.failure()).unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(
        harness
            .orchestrator
            .error_count(&module_context(ModuleKind::Social), ErrorKind::Timeout)
            .await,
        1
    );
}

#[tokio::test]
async fn test_panicking_module_is_isolated() {
    let harness = TestHelpers::with_module(
        ModuleKind::Backlink,
        Arc::new(FakeModule::new(ModuleKind::Backlink, Behavior::Panic)),
    );

    let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    assert_eq!(run.success_count + run.failure_count, 7);
    let failure = run.result_for(ModuleKind::Backlink).and_then(|r| r.failure()).unwrap();
    assert_eq!(failure.kind, FailureKind::Panicked);
    assert!(failure.message.contains("adapter crashed"));
}

#[tokio::test]
async fn test_finance_next_run_scales_with_performance() {
    let harness = OrchestratorBuilder::new().build();

    let run = TestHelpers::run(&harness, TestFixtures::FINANCE).await;

    assert_eq!(run.success_count, 7);
    assert!((run.average_performance - 0.8).abs() < 1e-12);
    let delay = run.next_run_at - run.finished_at;
    assert_eq!(delay, chrono::Duration::seconds(1800));
}

#[tokio::test]
async fn test_no_successes_uses_default_performance() {
    let builder = ModuleKind::ALL.into_iter().fold(OrchestratorBuilder::new(), |builder, kind| {
        builder.with_module(kind, Arc::new(FakeModule::failing(kind)))
    });
    let harness = builder.build();

    let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    assert_eq!(run.failure_count, 7);
    assert_eq!(run.average_performance, 0.5);
    assert_eq!(run.next_run_at - run.finished_at, chrono::Duration::seconds(1500));
}

#[tokio::test]
async fn test_strategy_failure_falls_back_to_default() {
    let harness = OrchestratorBuilder::new()
        .with_strategy_generator(|generator| {
            generator.expect_generate().returning(|_| {
                Err(OrchestratorError::StrategyGenerationFailed {
                    reason: "model store unavailable".to_string(),
                })
            });
        })
        .build();

    let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.strategy.source, StrategySource::ConservativeDefault);
    assert_eq!(run.success_count + run.failure_count, 7);
    assert_eq!(
        harness
            .orchestrator
            .error_count(&ComponentId::Orchestrator.to_string(), ErrorKind::StrategyGeneration)
            .await,
        1
    );
}

#[tokio::test]
async fn test_compliance_error_returns_partial_run() {
    let harness = OrchestratorBuilder::new()
        .with_compliance_validator(|validator| {
            validator.expect_validate().returning(|_, _| {
                Err(OrchestratorError::ComplianceEvaluationFailed {
                    reason: "policy table missing".to_string(),
                })
            });
        })
        .build();

    let result = harness
        .orchestrator
        .execute_growth_optimization(&TestFixtures::vertical(TestFixtures::SAAS))
        .await;

    match result {
        Err(error @ OrchestratorError::OrchestrationFailure { .. }) => {
            let partial = error.partial_run().unwrap();
            assert!(partial.strategy.is_some());
            assert!(partial.compliance.is_none());
            assert!(partial.results.is_empty());
        }
        other => panic!("expected orchestration failure, got {other:?}"),
    }
    assert_eq!(harness.sink.run_count().await, 0);
}

#[tokio::test]
async fn test_initialization_failure_yields_not_initialized_result() {
    let seo = Arc::new(FakeModule::succeeding(ModuleKind::Seo).init_failing());
    let harness = TestHelpers::with_module(ModuleKind::Seo, seo.clone());

    let first = TestHelpers::run(&harness, TestFixtures::SAAS).await;
    let second = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    for run in [&first, &second] {
        assert_eq!(run.success_count, 6);
        assert_eq!(run.failure_count, 1);
        let failure = run.result_for(ModuleKind::Seo).and_then(|r| r.failure()).unwrap();
        assert_eq!(failure.kind, FailureKind::NotInitialized);
    }
    assert_eq!(seo.init_calls(), 1);
    assert_eq!(seo.run_calls(), 0);
    assert_eq!(
        harness
            .orchestrator
            .error_count(&module_context(ModuleKind::Seo), ErrorKind::Initialization)
            .await,
        1
    );
}

#[tokio::test]
async fn test_concurrent_first_runs_initialize_once() {
    let content = Arc::new(FakeModule::succeeding(ModuleKind::Content));
    let harness = TestHelpers::with_module(ModuleKind::Content, content.clone());

    let verticals = ["saas", "finance", "travel", "gaming", "education"];
    let runs = futures_util::future::join_all(verticals.iter().map(|name| {
        let orchestrator = Arc::clone(&harness.orchestrator);
        async move {
            orchestrator
                .execute_growth_optimization(&TestFixtures::vertical(name))
                .await
        }
    }))
    .await;

    assert!(runs.iter().all(|run| run.is_ok()));
    assert_eq!(content.init_calls(), 1);
    assert_eq!(content.run_calls(), 5);
}

#[tokio::test]
async fn test_same_vertical_runs_are_serialized() {
    let slow = Arc::new(FakeModule::new(
        ModuleKind::Seo,
        Behavior::Slow(Duration::from_millis(40)),
    ));
    let harness = TestHelpers::with_module(ModuleKind::Seo, slow.clone());
    let saas = TestFixtures::vertical(TestFixtures::SAAS);

    let (first, second) = tokio::join!(
        harness.orchestrator.execute_growth_optimization(&saas),
        harness.orchestrator.execute_growth_optimization(&saas)
    );

    assert!(first.is_ok() && second.is_ok());
    assert_eq!(slow.max_in_flight(), 1);
}

#[tokio::test]
async fn test_different_verticals_run_in_parallel() {
    let slow = Arc::new(FakeModule::new(
        ModuleKind::Seo,
        Behavior::Slow(Duration::from_millis(40)),
    ));
    let harness = TestHelpers::with_module(ModuleKind::Seo, slow.clone());
    let saas = TestFixtures::vertical(TestFixtures::SAAS);
    let travel = TestFixtures::vertical(TestFixtures::TRAVEL);

    let (first, second) = tokio::join!(
        harness.orchestrator.execute_growth_optimization(&saas),
        harness.orchestrator.execute_growth_optimization(&travel)
    );

    assert!(first.is_ok() && second.is_ok());
    assert_eq!(slow.max_in_flight(), 2);
}

#[tokio::test]
async fn test_analytics_round_trip() {
    let harness = TestHelpers::with_module(ModuleKind::Email, Arc::new(FakeModule::failing(ModuleKind::Email)));

    TestHelpers::run(&harness, TestFixtures::SAAS).await;
    TestHelpers::run(&harness, TestFixtures::SAAS).await;
    TestHelpers::run(&harness, TestFixtures::FINANCE).await;

    let saas = harness
        .orchestrator
        .get_growth_analytics(Some(&TestFixtures::vertical(TestFixtures::SAAS)), Timeframe::Week)
        .await
        .unwrap();
    assert_eq!(saas.total_runs, 2);
    assert_eq!(saas.completed_runs, 2);
    assert_eq!(saas.success_count, 12);
    assert_eq!(saas.failure_count, 2);
    assert!((saas.success_rate - 12.0 / 14.0).abs() < 1e-12);

    let all = harness
        .orchestrator
        .get_growth_analytics(None, Timeframe::All)
        .await
        .unwrap();
    assert_eq!(all.total_runs, 3);
    assert_eq!(all.module_analytics.len(), 7);
    assert_eq!(all.module_analytics[&ModuleKind::Seo].runs, 3);
    assert!(all.unavailable_modules.is_empty());
}

#[tokio::test]
async fn test_analytics_reports_unavailable_modules() {
    let harness = TestHelpers::with_module(
        ModuleKind::Referral,
        Arc::new(FakeModule::succeeding(ModuleKind::Referral).analytics_failing()),
    );

    let analytics = harness
        .orchestrator
        .get_growth_analytics(None, Timeframe::Day)
        .await
        .unwrap();

    assert_eq!(analytics.unavailable_modules, vec![ModuleKind::Referral]);
    assert_eq!(analytics.module_analytics.len(), 6);
    assert_eq!(analytics.total_runs, 0);
}

#[tokio::test]
async fn test_recording_failure_does_not_fail_run() {
    let mut sink = MockRunSink::new();
    sink.expect_append_run()
        .returning(|_| Err(OrchestratorError::persistence("append runs.jsonl", "read-only file system")));
    let harness = OrchestratorBuilder::new().with_run_sink(Arc::new(sink)).build();

    let run = TestHelpers::run(&harness, TestFixtures::SAAS).await;

    assert_eq!(run.success_count, 7);
    assert_eq!(
        harness
            .orchestrator
            .error_count(&ComponentId::Recorder.to_string(), ErrorKind::Persistence)
            .await,
        1
    );
}

#[tokio::test]
async fn test_health_score_is_exact_fraction() {
    let builder = [ModuleKind::Seo, ModuleKind::Email]
        .into_iter()
        .fold(OrchestratorBuilder::new(), |builder, kind| {
            builder.with_module(kind, Arc::new(FakeModule::succeeding(kind).with_health(Some(false))))
        });
    let harness = builder.build();
    harness.orchestrator.initialize_modules().await;

    let outcome = harness
        .orchestrator
        .health_monitor()
        .run_health_check(HealthTrigger::Manual)
        .await;

    let report = match outcome {
        HealthCheckOutcome::Completed(report) => report,
        other => panic!("expected completed cycle, got {other:?}"),
    };
    assert_eq!(report.snapshot.overall_health_score, 100.0 * 5.0 / 7.0);
    // 71.4 is above the recovery threshold
    assert!(report.recovery.is_none());

    let health = harness.orchestrator.get_system_health().await;
    assert_eq!(health.overall_health, 100.0 * 5.0 / 7.0);
    assert!(health.recommendations.iter().any(|r| r.contains("seo")));
}

#[tokio::test]
async fn test_jsonl_stack_end_to_end() {
    let dir = TempDir::new().unwrap();
    let registry = ModuleKind::ALL.into_iter().fold(ModuleRegistry::new(), |registry, kind| {
        registry.with_module(kind, Arc::new(LocalGrowthModule::new(kind)))
    });
    let sink = Arc::new(JsonlRunSink::with_base_dir(dir.path().to_path_buf()));
    let recorder = Arc::new(AnalyticsRecorder::new(sink.clone(), 10));
    let orchestrator = GrowthOrchestrator::new(
        registry,
        HeuristicStrategyGenerator::new(),
        PolicyComplianceValidator::new(),
        recorder,
        TestFixtures::config(),
    );

    for name in ["saas", "finance", "gaming"] {
        let run = orchestrator
            .execute_growth_optimization(&TestFixtures::vertical(name))
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Completed, "{name} should pass the gate");
        assert_eq!(run.success_count, 7);
        assert!(run.estimated_roi > 0.0);
    }

    let analytics = orchestrator.get_growth_analytics(None, Timeframe::Day).await.unwrap();
    assert_eq!(analytics.total_runs, 3);
    assert_eq!(analytics.success_count, 21);
    assert_eq!(analytics.module_analytics[&ModuleKind::Email].runs, 3);

    let metrics = tokio::fs::read_to_string(sink.metrics_path()).await.unwrap();
    assert_eq!(metrics.lines().count(), 21);
}

#[tokio::test]
async fn test_scheduler_runs_each_vertical_until_cancelled() {
    let harness = OrchestratorBuilder::new().build();
    let verticals = vec![
        TestFixtures::vertical(TestFixtures::SAAS),
        TestFixtures::vertical(TestFixtures::TRAVEL),
    ];
    let scheduler = Arc::new(RunScheduler::new(Arc::clone(&harness.orchestrator), verticals));
    let cancel = CancellationToken::new();

    let handle = Arc::clone(&scheduler).spawn(cancel.clone());
    let deadline = Instant::now() + Duration::from_secs(2);
    while harness.sink.run_count().await < 2 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler should stop after cancellation")
        .unwrap();

    // Next runs are 1800s away, so each vertical ran exactly once
    assert_eq!(harness.sink.run_count().await, 2);
}

#[tokio::test]
async fn test_scheduler_run_once_reports_each_vertical() {
    let harness = OrchestratorBuilder::new().build();
    let scheduler = RunScheduler::new(
        Arc::clone(&harness.orchestrator),
        vec![TestFixtures::vertical("saas"), TestFixtures::vertical("education")],
    );

    let outcomes = scheduler.run_once().await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|(_, outcome)| outcome.is_ok()));
}

#[tokio::test]
async fn test_scheduler_uses_retry_delay_after_failure() {
    let harness = OrchestratorBuilder::new()
        .with_config(|config: &mut EngineConfig| config.retry_delay = Duration::from_secs(42))
        .build();
    let scheduler = RunScheduler::new(Arc::clone(&harness.orchestrator), Vec::new());

    let failed = Err(OrchestratorError::config("boom"));
    assert_eq!(scheduler.next_delay(&failed, chrono::Utc::now()), Duration::from_secs(42));
}
