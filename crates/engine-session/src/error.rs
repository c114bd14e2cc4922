//! Error types for engine sessions.

use std::time::Duration;
use thiserror::Error;
use uci::UciError;

/// Errors raised while starting an engine process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The request cannot be expressed as a UCI script.
    #[error("Invalid analysis request: {0}")]
    InvalidRequest(#[from] UciError),
    /// Failed to spawn the engine process.
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    /// The engine closed its input before the command script was delivered.
    #[error("Failed to send commands to engine: {0}")]
    Write(#[source] std::io::Error),
}

/// The ways a single analysis can fail.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The position could not be sent to the engine.
    #[error("Invalid analysis request: {0}")]
    InvalidRequest(#[from] UciError),
    /// The engine executable could not be started.
    #[error("Engine could not be started: {0}")]
    SpawnFailure(#[source] std::io::Error),
    /// The engine went away before producing a best move.
    #[error("Engine crashed: {0}")]
    EngineCrashed(String),
    /// No best move arrived within the configured deadline.
    #[error("Engine did not finish within {0:?}")]
    Timeout(Duration),
    /// The concurrency limiter was shut down.
    #[error("Analyzer is shutting down")]
    Closed,
}

impl From<EngineError> for AnalysisError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRequest(e) => AnalysisError::InvalidRequest(e),
            EngineError::Spawn(e) => AnalysisError::SpawnFailure(e),
            EngineError::Write(e) => {
                AnalysisError::EngineCrashed(format!("engine closed its input: {}", e))
            }
        }
    }
}
