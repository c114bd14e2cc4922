//! Engine output line classification.

/// A single line of engine output, reduced to the facts an analysis needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    /// The line carried a `score cp <n>` marker.
    Score(i32),
    /// Terminal `bestmove <move> [ponder <move>]` line.
    BestMove {
        best_move: Option<String>,
        ponder: Option<String>,
    },
    /// Anything else, including malformed score markers.
    Other,
}

/// Outcome of looking for a `score cp` marker in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScoreMarker<'a> {
    Absent,
    Valid(i32),
    Malformed(&'a str),
}

fn find_score_cp(line: &str) -> ScoreMarker<'_> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut marker = ScoreMarker::Absent;

    for (i, window) in tokens.windows(2).enumerate() {
        if window[0] != "score" || window[1] != "cp" {
            continue;
        }
        match tokens.get(i + 2) {
            Some(&raw) => match raw.parse::<i32>() {
                Ok(cp) => marker = ScoreMarker::Valid(cp),
                Err(_) => {
                    if marker == ScoreMarker::Absent {
                        marker = ScoreMarker::Malformed(raw);
                    }
                }
            },
            None => {
                if marker == ScoreMarker::Absent {
                    marker = ScoreMarker::Malformed("");
                }
            }
        }
    }

    marker
}

/// Classify one line of engine output.
///
/// Lines whose first token is `bestmove` are terminal; any other line that
/// contains a parsable `score cp` marker is a score update.
pub fn parse_line(line: &str) -> EngineLine {
    let line = line.trim();
    let mut parts = line.split_whitespace();

    if parts.next() == Some("bestmove") {
        let best_move = parts.next().map(str::to_string);
        let ponder = match (parts.next(), parts.next()) {
            (Some("ponder"), Some(mv)) => Some(mv.to_string()),
            _ => None,
        };
        return EngineLine::BestMove { best_move, ponder };
    }

    match find_score_cp(line) {
        ScoreMarker::Valid(cp) => EngineLine::Score(cp),
        ScoreMarker::Malformed(raw) => {
            tracing::trace!(line = line, value = raw, "ignoring malformed score marker");
            EngineLine::Other
        }
        ScoreMarker::Absent => EngineLine::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_info_score() {
        let line = "info depth 12 seldepth 18 score cp 30 nodes 125000 nps 500000 pv e2e4 e7e5";
        assert_eq!(parse_line(line), EngineLine::Score(30));
    }

    #[test]
    fn parse_negative_score() {
        assert_eq!(
            parse_line("info depth 10 score cp -150 nodes 25000 pv e7e5"),
            EngineLine::Score(-150)
        );
    }

    #[test]
    fn score_marker_anywhere_in_line() {
        assert_eq!(parse_line("score cp 7"), EngineLine::Score(7));
        assert_eq!(parse_line("info score cp 12 upperbound"), EngineLine::Score(12));
    }

    #[test]
    fn mate_score_is_not_centipawns() {
        assert_eq!(parse_line("info depth 20 score mate 3 pv e2e4"), EngineLine::Other);
    }

    #[test]
    fn malformed_score_is_ignored() {
        assert_eq!(parse_line("score cp notanumber"), EngineLine::Other);
        assert_eq!(parse_line("info depth 3 score cp"), EngineLine::Other);
        assert_eq!(parse_line("score cp 99999999999999"), EngineLine::Other);
    }

    #[test]
    fn last_valid_marker_wins() {
        assert_eq!(parse_line("score cp 5 score cp 9"), EngineLine::Score(9));
        assert_eq!(parse_line("score cp 5 score cp oops"), EngineLine::Score(5));
    }

    #[test]
    fn parse_bestmove_with_ponder() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            EngineLine::BestMove {
                best_move: Some("e2e4".to_string()),
                ponder: Some("e7e5".to_string()),
            }
        );
    }

    #[test]
    fn parse_bestmove_promotion_and_none() {
        assert_eq!(
            parse_line("bestmove a7a8q"),
            EngineLine::BestMove {
                best_move: Some("a7a8q".to_string()),
                ponder: None,
            }
        );
        assert_eq!(
            parse_line("bestmove (none)"),
            EngineLine::BestMove {
                best_move: Some("(none)".to_string()),
                ponder: None,
            }
        );
    }

    #[test]
    fn bare_bestmove_has_no_move() {
        assert_eq!(
            parse_line("bestmove"),
            EngineLine::BestMove {
                best_move: None,
                ponder: None,
            }
        );
    }

    #[test]
    fn bestmove_must_be_first_token() {
        assert_eq!(parse_line("info string bestmove e2e4"), EngineLine::Other);
        assert_eq!(parse_line("bestmovee2e4"), EngineLine::Other);
    }

    #[test]
    fn unrelated_lines_are_other() {
        assert_eq!(parse_line("id name Stockfish 16"), EngineLine::Other);
        assert_eq!(parse_line("uciok"), EngineLine::Other);
        assert_eq!(parse_line(""), EngineLine::Other);
    }
}
