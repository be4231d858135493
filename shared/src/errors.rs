//! Shared error types for the growth orchestration engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SharedError {
    #[error("Invalid vertical: {input:?}")]
    InvalidVertical { input: String },

    #[error("Unknown module: {input}")]
    UnknownModule { input: String },

    #[error("Unknown timeframe: {input}")]
    UnknownTimeframe { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
