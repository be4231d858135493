//! Shared types for the growth orchestration engine
//!
//! Contains the domain data model exchanged between the orchestrator, its
//! module adapters and the persistence sink, plus process-wide logging setup.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
