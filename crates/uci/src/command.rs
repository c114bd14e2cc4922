//! Commands sent from the analysis client to an engine.

use crate::UciError;
use std::fmt;
use std::str::FromStr;

/// Commands a GUI (here: the analysis client) sends to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Announce that the next search belongs to a new game.
    UciNewGame,
    /// Check if engine is ready.
    IsReady,
    /// Set up position from FEN.
    Position { fen: String },
    /// Search to a fixed depth.
    Go { depth: u32 },
    /// Quit the engine.
    Quit,
}

impl GuiCommand {
    /// Format the command as a single UCI line (without newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::UciNewGame => "ucinewgame".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::Position { fen } => format!("position fen {}", fen),
            GuiCommand::Go { depth } => format!("go depth {}", depth),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}

impl fmt::Display for GuiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

/// Which preamble is sent ahead of the position and search commands.
///
/// Engines differ in how strictly they expect `ucinewgame` / `isready`
/// before a search; all variants send `position` before `go`, and `go`
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handshake {
    /// `uci`, `position`, `go`.
    Minimal,
    /// `uci`, `ucinewgame`, `position`, `go`.
    #[default]
    NewGame,
    /// `uci`, `ucinewgame`, `isready`, `position`, `go`.
    NewGameReady,
}

impl Handshake {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handshake::Minimal => "minimal",
            Handshake::NewGame => "new-game",
            Handshake::NewGameReady => "new-game-ready",
        }
    }
}

impl FromStr for Handshake {
    type Err = UciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Handshake::Minimal),
            "new-game" | "newgame" => Ok(Handshake::NewGame),
            "new-game-ready" | "newgameready" => Ok(Handshake::NewGameReady),
            other => Err(UciError::InvalidCommand(format!(
                "unknown handshake '{}'",
                other
            ))),
        }
    }
}

/// Longest FEN accepted, in bytes. Real positions stay under 100.
pub const MAX_FEN_LEN: usize = 256;

/// Check that `fen` can be sent verbatim as a `position fen` argument.
///
/// Returns the trimmed FEN. It must be non-empty, at most [`MAX_FEN_LEN`]
/// bytes, and free of line breaks (which would smuggle extra commands into
/// the engine's input).
pub fn validate_fen(fen: &str) -> Result<&str, UciError> {
    let fen = fen.trim();
    if fen.is_empty() {
        return Err(UciError::InvalidCommand("empty FEN".to_string()));
    }
    if fen.len() > MAX_FEN_LEN {
        return Err(UciError::InvalidCommand(format!(
            "FEN is {} bytes, limit is {}",
            fen.len(),
            MAX_FEN_LEN
        )));
    }
    if fen.contains(['\n', '\r']) {
        return Err(UciError::InvalidCommand(
            "FEN must be a single line".to_string(),
        ));
    }
    Ok(fen)
}

/// The fixed command sequence for one single-position analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandScript {
    commands: Vec<GuiCommand>,
}

impl CommandScript {
    /// Build the script for analysing `fen` to `depth` plies.
    ///
    /// The FEN is sent verbatim and must pass [`validate_fen`].
    pub fn new(fen: &str, depth: u32, handshake: Handshake) -> Result<Self, UciError> {
        let fen = validate_fen(fen)?;

        let mut commands = vec![GuiCommand::Uci];
        match handshake {
            Handshake::Minimal => {}
            Handshake::NewGame => commands.push(GuiCommand::UciNewGame),
            Handshake::NewGameReady => {
                commands.push(GuiCommand::UciNewGame);
                commands.push(GuiCommand::IsReady);
            }
        }
        commands.push(GuiCommand::Position {
            fen: fen.to_string(),
        });
        commands.push(GuiCommand::Go { depth });

        Ok(Self { commands })
    }

    pub fn commands(&self) -> &[GuiCommand] {
        &self.commands
    }

    /// Render the script as newline-terminated bytes ready for the engine's stdin.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        for cmd in &self.commands {
            out.push_str(&cmd.to_uci());
            out.push('\n');
        }
        out.into_bytes()
    }
}
