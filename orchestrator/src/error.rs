//! Orchestrator-specific error types

use shared::{ErrorKind, ModuleKind, PartialRun, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Module {module} failed to initialize: {reason}")]
    InitializationFailure { module: ModuleKind, reason: String },

    #[error("Module {module} execution failed: {reason}")]
    ModuleExecutionFailure { module: ModuleKind, reason: String },

    #[error("Orchestration failed during {stage}: {reason}")]
    OrchestrationFailure {
        stage: String,
        reason: String,
        partial: Box<PartialRun>,
    },

    #[error("Recovery of module {module} failed: {reason}")]
    RecoveryFailure { module: ModuleKind, reason: String },

    #[error("Strategy generation failed: {reason}")]
    StrategyGenerationFailed { reason: String },

    #[error("Compliance evaluation failed: {reason}")]
    ComplianceEvaluationFailed { reason: String },

    #[error("Persistence failed: {operation}: {reason}")]
    PersistenceError { operation: String, reason: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        OrchestratorError::ConfigurationError { field: field.into() }
    }

    pub fn persistence(operation: impl Into<String>, reason: impl ToString) -> Self {
        OrchestratorError::PersistenceError {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Counter bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::InitializationFailure { .. } => ErrorKind::Initialization,
            OrchestratorError::ModuleExecutionFailure { .. } => ErrorKind::ModuleExecution,
            OrchestratorError::OrchestrationFailure { .. } => ErrorKind::Orchestration,
            OrchestratorError::RecoveryFailure { .. } => ErrorKind::Recovery,
            OrchestratorError::StrategyGenerationFailed { .. } => ErrorKind::StrategyGeneration,
            OrchestratorError::ComplianceEvaluationFailed { .. } => ErrorKind::ComplianceEvaluation,
            OrchestratorError::PersistenceError { .. }
            | OrchestratorError::IoError(_)
            | OrchestratorError::JsonError(_) => ErrorKind::Persistence,
            OrchestratorError::ConfigurationError { .. } | OrchestratorError::SharedError(_) => {
                ErrorKind::Orchestration
            }
        }
    }

    /// Partial run attached to an orchestration failure
    pub fn partial_run(&self) -> Option<&PartialRun> {
        match self {
            OrchestratorError::OrchestrationFailure { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
