//! Incremental parsing of raw engine output.
//!
//! Engine stdout arrives as byte chunks with no relation to line
//! boundaries. [`LineBuffer`] reassembles lines across chunks and
//! [`OutputParser`] turns them into [`ParseEvent`]s for one analysis
//! session, ending with the `bestmove` event.

use crate::info::{parse_line, EngineLine};

/// Carry-over buffer that splits a byte stream into text lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw output.
    pub fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Take the next complete line, without its terminator.
    ///
    /// Both `\n` and `\r\n` endings are accepted. Invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        Some(decode_line(&raw[..end]))
    }

    /// Take whatever is left after the stream ended, if anything.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        Some(decode_line(&raw))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// The terminal result of a session's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// Move token following `bestmove`, e.g. `e2e4`, `a7a8q` or `(none)`.
    pub best_move: Option<String>,
    /// Optional `ponder` move.
    pub ponder: Option<String>,
    /// Last centipawn score seen before the `bestmove` line.
    pub evaluation: Option<i32>,
}

/// Facts extracted from engine output, in the order the engine produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// A new centipawn evaluation replaced the previous one.
    Evaluation(i32),
    /// The search finished. No further events follow.
    BestMove(BestMove),
}

/// Per-session parser over an engine's stdout.
///
/// Feed it chunks with [`feed`](Self::feed) and drain events lazily with
/// [`events`](Self::events). Once the `bestmove` event has been produced the
/// parser is finished: later input is discarded and no more events appear.
#[derive(Debug, Default)]
pub struct OutputParser {
    buffer: LineBuffer,
    evaluation: Option<i32>,
    finished: bool,
}

impl OutputParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a raw output chunk. Ignored once the parser is finished.
    pub fn feed(&mut self, chunk: &[u8]) {
        if !self.finished {
            self.buffer.push(chunk);
        }
    }

    /// Lazily yield events for the complete lines buffered so far.
    pub fn events(&mut self) -> Events<'_> {
        Events { parser: self }
    }

    /// Flush a trailing unterminated line once the stream has ended.
    ///
    /// Returns the event that line produced, if any. The parser is finished
    /// afterwards regardless.
    pub fn finish(&mut self) -> Option<ParseEvent> {
        if self.finished {
            return None;
        }
        let event = self
            .buffer
            .finish()
            .and_then(|line| self.process_line(&line));
        self.finished = true;
        event
    }

    /// The most recent centipawn evaluation.
    pub fn evaluation(&self) -> Option<i32> {
        self.evaluation
    }

    fn process_line(&mut self, line: &str) -> Option<ParseEvent> {
        tracing::trace!(line = line, "engine output");
        match parse_line(line) {
            EngineLine::Score(cp) => {
                self.evaluation = Some(cp);
                Some(ParseEvent::Evaluation(cp))
            }
            EngineLine::BestMove { best_move, ponder } => {
                self.finished = true;
                Some(ParseEvent::BestMove(BestMove {
                    best_move,
                    ponder,
                    evaluation: self.evaluation,
                }))
            }
            EngineLine::Other => None,
        }
    }
}

/// Iterator returned by [`OutputParser::events`].
pub struct Events<'a> {
    parser: &'a mut OutputParser,
}

impl Iterator for Events<'_> {
    type Item = ParseEvent;

    fn next(&mut self) -> Option<ParseEvent> {
        while !self.parser.finished {
            let line = self.parser.buffer.next_line()?;
            if let Some(event) = self.parser.process_line(&line) {
                return Some(event);
            }
        }
        None
    }
}
