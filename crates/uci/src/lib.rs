//! Client-side UCI (Universal Chess Interface) protocol support.
//!
//! This crate covers the half of UCI an analysis client needs:
//!
//! # Outbound
//!
//! - `uci` - Initialize engine
//! - `ucinewgame` / `isready` - Optional preamble, see [`Handshake`]
//! - `position fen <fen>` - Set position
//! - `go depth <d>` - Start search
//!
//! # Inbound
//!
//! - `info ... score cp <n> ...` - Centipawn evaluation
//! - `bestmove <move> [ponder <move>]` - Search finished
//!
//! Raw stdout bytes are turned into events by [`OutputParser`].

mod command;
mod info;
mod parser;

pub use command::{validate_fen, CommandScript, GuiCommand, Handshake, MAX_FEN_LEN};
pub use info::{parse_line, EngineLine};
pub use parser::{BestMove, Events, LineBuffer, OutputParser, ParseEvent};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
