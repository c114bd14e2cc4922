//! Analysis request coordination.
//!
//! [`Analyzer::analyze`] binds one engine process and one output parser to
//! one caller-visible outcome. Every call owns its own process; the process
//! is terminated before the call returns, whatever the outcome.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use uci::{Handshake, OutputParser, ParseEvent};

use crate::error::AnalysisError;
use crate::process::EngineProcess;
use crate::{AnalysisRequest, AnalysisResult};

/// Search depth used when none is configured.
pub const DEFAULT_DEPTH: u32 = 15;

/// How engines are launched and driven.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable.
    pub path: PathBuf,
    /// Extra command-line arguments for the executable.
    pub args: Vec<String>,
    /// Fixed search depth for every analysis.
    pub depth: u32,
    /// Command preamble variant.
    pub handshake: Handshake,
    /// Deadline for a single analysis. `None` waits for the engine indefinitely.
    pub timeout: Option<Duration>,
    /// Upper bound on simultaneously running engines. `None` spawns one per
    /// call with no queueing.
    pub max_concurrent: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockfish"),
            args: Vec::new(),
            depth: DEFAULT_DEPTH,
            handshake: Handshake::default(),
            timeout: None,
            max_concurrent: None,
        }
    }
}

/// Runs single-position analyses, one engine process per call.
pub struct Analyzer {
    config: EngineConfig,
    limiter: Option<Arc<Semaphore>>,
    active: Arc<AtomicUsize>,
}

impl Analyzer {
    pub fn new(config: EngineConfig) -> Self {
        let limiter = config
            .max_concurrent
            .map(|n| Arc::new(Semaphore::new(n.max(1))));
        Self {
            config,
            limiter,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of engine processes currently owned by this analyzer.
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Analyze a position given in FEN notation.
    ///
    /// Settles exactly once:
    /// - `Ok` as soon as the engine prints `bestmove`
    /// - [`AnalysisError::SpawnFailure`] if the engine cannot be started
    /// - [`AnalysisError::EngineCrashed`] if the engine exits first
    /// - [`AnalysisError::Timeout`] if a deadline is configured and passes first
    ///
    /// The engine process has been terminated by the time this returns. If
    /// the returned future is dropped early, the process is killed on drop.
    pub async fn analyze(&self, fen: &str) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalysisRequest::new(fen, self.config.depth)?;

        let _permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| AnalysisError::Closed)?,
            ),
            None => None,
        };

        let script = request.script(self.config.handshake)?;
        let started = Instant::now();
        let _session = SessionGuard::enter(&self.active);
        let mut process = EngineProcess::spawn(&self.config.path, &self.config.args)?;
        let pid = process.id();

        // Spawning is synchronous; everything that can wait on the engine
        // runs under the deadline.
        let session = async {
            process.send_script(&script).await?;
            run_session(&mut process).await
        };
        let outcome = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, session)
                .await
                .unwrap_or(Err(AnalysisError::Timeout(limit))),
            None => session.await,
        };

        let status = process.terminate().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                tracing::info!(
                    pid = pid,
                    fen = request.fen(),
                    best_move = result.best_move.as_deref(),
                    evaluation = result.evaluation,
                    duration_ms = elapsed_ms,
                    "analysis complete"
                );
                Ok(result)
            }
            Err(AnalysisError::EngineCrashed(reason)) => {
                let reason = match status {
                    Some(status) => format!("{} ({})", reason, status),
                    None => reason,
                };
                tracing::warn!(pid = pid, fen = request.fen(), reason = %reason, "engine crashed");
                Err(AnalysisError::EngineCrashed(reason))
            }
            Err(e) => {
                tracing::warn!(pid = pid, fen = request.fen(), error = %e, "analysis failed");
                Err(e)
            }
        }
    }
}

/// Drive one session until the parser reports a best move or output ends.
async fn run_session(process: &mut EngineProcess) -> Result<AnalysisResult, AnalysisError> {
    let mut parser = OutputParser::new();

    loop {
        let chunk = process.next_chunk().await.map_err(|e| {
            AnalysisError::EngineCrashed(format!("reading engine output failed: {}", e))
        })?;

        match chunk {
            Some(bytes) => {
                parser.feed(&bytes);
                for event in parser.events() {
                    if let ParseEvent::BestMove(best) = event {
                        return Ok(best.into());
                    }
                }
            }
            None => {
                if let Some(ParseEvent::BestMove(best)) = parser.finish() {
                    return Ok(best.into());
                }
                return Err(AnalysisError::EngineCrashed(
                    "engine exited before reporting a best move".to_string(),
                ));
            }
        }
    }
}

/// Counts a live engine process for [`Analyzer::active_sessions`].
struct SessionGuard {
    active: Arc<AtomicUsize>,
}

impl SessionGuard {
    fn enter(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self {
            active: Arc::clone(active),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
