//! Test helpers and builder patterns for orchestrator tests
//!
//! Configurable fake modules plus a builder that wires them, mock strategy and
//! compliance collaborators and an in-memory sink into an orchestrator.

use async_trait::async_trait;
use shared::{ModuleAnalytics, ModuleKind, ModuleReport, ModuleWeights, RunContext, Timeframe, Vertical};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use growth_orchestrator::traits::{MockComplianceValidator, MockStrategyGenerator};
use growth_orchestrator::{
    AnalyticsRecorder, CompliancePolicy, EngineConfig, GrowthModule, GrowthOrchestrator, HeuristicStrategyGenerator,
    InMemoryRunSink, ModuleRegistry, OrchestratorError, OrchestratorResult, RunSink,
};

use super::fixtures::TestFixtures;

pub type TestOrchestrator = GrowthOrchestrator<MockStrategyGenerator, MockComplianceValidator>;

/// How a fake module answers `run`
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed {
        investment: f64,
        estimated_return: f64,
        performance: f64,
    },
    /// Succeed after sleeping
    Slow(Duration),
    Fail,
    Panic,
    Hang,
}

pub struct FakeModule {
    kind: ModuleKind,
    behavior: Behavior,
    init_fails: bool,
    analytics_fails: bool,
    health: Option<bool>,
    init_calls: AtomicUsize,
    run_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeModule {
    pub fn new(kind: ModuleKind, behavior: Behavior) -> Self {
        Self {
            kind,
            behavior,
            init_fails: false,
            analytics_fails: false,
            health: None,
            init_calls: AtomicUsize::new(0),
            run_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Investment 100, return 150, performance 0.8
    pub fn succeeding(kind: ModuleKind) -> Self {
        Self::new(
            kind,
            Behavior::Succeed {
                investment: 100.0,
                estimated_return: 150.0,
                performance: 0.8,
            },
        )
    }

    pub fn failing(kind: ModuleKind) -> Self {
        Self::new(kind, Behavior::Fail)
    }

    pub fn init_failing(mut self) -> Self {
        self.init_fails = true;
        self
    }

    pub fn analytics_failing(mut self) -> Self {
        self.analytics_fails = true;
        self
    }

    pub fn with_health(mut self, healthy: Option<bool>) -> Self {
        self.health = healthy;
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn error(&self, reason: &str) -> OrchestratorError {
        OrchestratorError::ModuleExecutionFailure {
            module: self.kind,
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl GrowthModule for FakeModule {
    async fn initialize(&self) -> OrchestratorResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.init_fails {
            return Err(OrchestratorError::InitializationFailure {
                module: self.kind,
                reason: "credentials rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn run(&self, _context: &RunContext, _weights: &ModuleWeights) -> OrchestratorResult<ModuleReport> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = match &self.behavior {
            Behavior::Succeed {
                investment,
                estimated_return,
                performance,
            } => Ok(TestFixtures::report(self.kind, *investment, *estimated_return, *performance)),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(TestFixtures::report(self.kind, 100.0, 150.0, 0.8))
            }
            Behavior::Fail => Err(self.error("upstream API returned 503")),
            Behavior::Panic => panic!("adapter crashed"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(self.error("unreachable"))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_analytics(&self, _vertical: Option<Vertical>, _timeframe: Timeframe) -> OrchestratorResult<ModuleAnalytics> {
        if self.analytics_fails {
            return Err(self.error("analytics backend offline"));
        }
        let runs = self.run_calls() as u64;
        Ok(ModuleAnalytics {
            runs,
            successes: runs,
            ..ModuleAnalytics::default()
        })
    }

    async fn health_check(&self) -> Option<bool> {
        self.health
    }
}

/// Orchestrator plus handles tests inspect after running it
pub struct TestHarness {
    pub orchestrator: Arc<TestOrchestrator>,
    pub sink: Arc<InMemoryRunSink>,
}

/// Builder pattern for creating test orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    modules: BTreeMap<ModuleKind, Arc<dyn GrowthModule>>,
    strategy_generator: Option<MockStrategyGenerator>,
    compliance_validator: Option<MockComplianceValidator>,
    sink: Arc<InMemoryRunSink>,
    run_sink: Option<Arc<dyn RunSink>>,
    config: EngineConfig,
}

impl OrchestratorBuilder {
    /// Seven succeeding modules, heuristic strategy, policy compliance
    pub fn new() -> Self {
        Self {
            modules: ModuleKind::ALL
                .into_iter()
                .map(|kind| (kind, Arc::new(FakeModule::succeeding(kind)) as Arc<dyn GrowthModule>))
                .collect(),
            strategy_generator: None,
            compliance_validator: None,
            sink: Arc::new(InMemoryRunSink::new()),
            run_sink: None,
            config: TestFixtures::config(),
        }
    }

    pub fn with_module(mut self, kind: ModuleKind, module: Arc<dyn GrowthModule>) -> Self {
        self.modules.insert(kind, module);
        self
    }

    pub fn with_strategy_generator<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockStrategyGenerator),
    {
        let mut generator = MockStrategyGenerator::new();
        setup(&mut generator);
        self.strategy_generator = Some(generator);
        self
    }

    pub fn with_compliance_validator<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockComplianceValidator),
    {
        let mut validator = MockComplianceValidator::new();
        setup(&mut validator);
        self.compliance_validator = Some(validator);
        self
    }

    /// Persist through `sink` instead of the default in-memory sink
    pub fn with_run_sink(mut self, sink: Arc<dyn RunSink>) -> Self {
        self.run_sink = Some(sink);
        self
    }

    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut EngineConfig),
    {
        setup(&mut self.config);
        self
    }

    pub fn build(self) -> TestHarness {
        let strategy_generator = self.strategy_generator.unwrap_or_else(|| {
            let mut generator = MockStrategyGenerator::new();
            generator
                .expect_generate()
                .returning(|vertical| Ok(HeuristicStrategyGenerator::new().strategy_for(vertical)));
            generator
        });
        let compliance_validator = self.compliance_validator.unwrap_or_else(|| {
            let mut validator = MockComplianceValidator::new();
            validator
                .expect_validate()
                .returning(|vertical, strategy| Ok(CompliancePolicy::default().evaluate(vertical, strategy)));
            validator
        });

        let registry = self
            .modules
            .into_iter()
            .fold(ModuleRegistry::new(), |registry, (kind, module)| registry.with_module(kind, module));
        let run_sink: Arc<dyn RunSink> = match self.run_sink {
            Some(sink) => sink,
            None => self.sink.clone(),
        };
        let recorder = Arc::new(AnalyticsRecorder::new(run_sink, self.config.metrics_capacity));

        TestHarness {
            orchestrator: Arc::new(GrowthOrchestrator::new(
                registry,
                strategy_generator,
                compliance_validator,
                recorder,
                self.config,
            )),
            sink: self.sink,
        }
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Common test operations
pub struct TestHelpers;

impl TestHelpers {
    /// Default harness with one module replaced
    pub fn with_module(kind: ModuleKind, module: Arc<FakeModule>) -> TestHarness {
        OrchestratorBuilder::new().with_module(kind, module).build()
    }

    pub async fn run(harness: &TestHarness, vertical: &str) -> shared::OptimizationRun {
        harness
            .orchestrator
            .execute_growth_optimization(&TestFixtures::vertical(vertical))
            .await
            .expect("run should complete")
    }

    /// Module kinds in result order
    pub fn result_modules(run: &shared::OptimizationRun) -> Vec<ModuleKind> {
        run.results.iter().map(|result| result.module).collect()
    }
}
