//! Move explanation endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::commentary::{MoveContext, Side};
use crate::error::ApiError;
use crate::AppState;

/// Body of `POST /explain`.
#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    /// Position in FEN notation.
    #[serde(default)]
    pub fen: Option<String>,
    /// Move to explain, in UCI notation.
    #[serde(default, rename = "move")]
    pub mv: Option<String>,
    /// Moves played so far, space separated.
    #[serde(default)]
    pub history: Option<String>,
    /// Side to move: `w`, `b`, `white` or `black`. Read from the FEN if omitted.
    #[serde(default)]
    pub turn: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

impl ExplainRequest {
    /// Validate the request into a prompt context.
    pub fn into_context(self) -> Result<MoveContext, ApiError> {
        let fen = non_blank(self.fen).ok_or(ApiError::MissingInput("fen"))?;
        let mv = non_blank(self.mv).ok_or(ApiError::MissingInput("move"))?;

        let side = match non_blank(self.turn) {
            Some(turn) => Side::parse(&turn).ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "Invalid turn '{}': expected w, b, white or black",
                    turn
                ))
            })?,
            None => Side::from_fen(&fen).ok_or(ApiError::MissingInput("turn"))?,
        };

        Ok(MoveContext {
            fen,
            mv,
            history: self.history.unwrap_or_default(),
            side,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /explain
///
/// Asks the language model why a move is good. Model failures are not
/// errors: the response then carries a fixed fallback explanation.
///
/// # Errors
/// * 400 Bad Request - `fen` or `move` missing, or `turn` invalid
pub async fn explain(
    State(state): State<AppState>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let Json(request) = payload?;
    let ctx = request.into_context()?;

    let explanation = state.commentary.explain(&ctx).await;

    Ok(Json(ExplainResponse { explanation }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ExplainRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_full_request() {
        let ctx = request(
            r#"{"fen": "8/8/8/8/8/8/8/K6k w - - 0 1", "move": "a1b2", "history": "e2e4 e7e5", "turn": "white"}"#,
        )
        .into_context()
        .unwrap();
        assert_eq!(ctx.mv, "a1b2");
        assert_eq!(ctx.history, "e2e4 e7e5");
        assert_eq!(ctx.side, Side::White);
    }

    #[test]
    fn test_turn_defaults_to_fen() {
        let ctx = request(r#"{"fen": "8/8/8/8/8/8/8/K6k b - - 0 1", "move": "h1g1"}"#)
            .into_context()
            .unwrap();
        assert_eq!(ctx.side, Side::Black);
        assert_eq!(ctx.history, "");
    }

    #[test]
    fn test_missing_move() {
        let result = request(r#"{"fen": "8/8/8/8/8/8/8/K6k w - - 0 1", "move": " "}"#)
            .into_context();
        assert!(matches!(result, Err(ApiError::MissingInput("move"))));
    }

    #[test]
    fn test_invalid_turn() {
        let result = request(r#"{"fen": "8/8/8/8/8/8/8/K6k w - - 0 1", "move": "a1a2", "turn": "green"}"#)
            .into_context();
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_turn_needed_when_fen_has_no_side() {
        let result = request(r#"{"fen": "8/8/8/8/8/8/8/K6k", "move": "a1a2"}"#).into_context();
        assert!(matches!(result, Err(ApiError::MissingInput("turn"))));
    }
}
