//! Single-shot chess engine sessions.
//!
//! Each analysis spawns its own UCI engine process, feeds it a fixed command
//! script, parses its output until `bestmove`, and terminates it. Nothing is
//! shared between sessions.
//!
//! # Example
//!
//! ```no_run
//! use engine_session::{Analyzer, EngineConfig};
//!
//! # async fn run() -> Result<(), engine_session::AnalysisError> {
//! let analyzer = Analyzer::new(EngineConfig::default());
//! let result = analyzer
//!     .analyze("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
//!     .await?;
//! println!("{:?} ({:?} cp)", result.best_move, result.evaluation);
//! # Ok(())
//! # }
//! ```

mod analyzer;
mod error;
mod process;

pub use analyzer::{Analyzer, EngineConfig, DEFAULT_DEPTH};
pub use error::{AnalysisError, EngineError};
pub use process::EngineProcess;

use uci::{CommandScript, Handshake, UciError};

/// One position to analyze. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    fen: String,
    depth: u32,
}

impl AnalysisRequest {
    /// Create a request, trimming the FEN.
    ///
    /// # Errors
    ///
    /// [`UciError::InvalidCommand`] if the FEN fails [`uci::validate_fen`].
    pub fn new(fen: &str, depth: u32) -> Result<Self, UciError> {
        let fen = uci::validate_fen(fen)?;
        Ok(Self {
            fen: fen.to_string(),
            depth,
        })
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The command script that asks an engine for this position.
    pub fn script(&self, handshake: Handshake) -> Result<CommandScript, UciError> {
        CommandScript::new(&self.fen, self.depth, handshake)
    }
}

/// Outcome of a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisResult {
    /// Best move in UCI notation (e.g. `e2e4`), or `(none)` when the side to
    /// move has no legal moves. Absent only if the engine printed a bare
    /// `bestmove`.
    pub best_move: Option<String>,
    /// Expected reply, when the engine suggests one.
    pub ponder: Option<String>,
    /// Last centipawn score reported before the best move.
    pub evaluation: Option<i32>,
}

impl From<uci::BestMove> for AnalysisResult {
    fn from(best: uci::BestMove) -> Self {
        Self {
            best_move: best.best_move,
            ponder: best.ponder,
            evaluation: best.evaluation,
        }
    }
}
