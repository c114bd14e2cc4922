//! Analysis API endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

/// Body of `POST /analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Position in FEN notation.
    #[serde(default)]
    pub fen: Option<String>,
}

/// Analysis response.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Best move in UCI notation.
    pub best_move: Option<String>,
    /// Score in centipawns from the engine's point of view.
    pub evaluation: Option<i32>,
}

/// POST /analyze
///
/// Runs one engine search on the posted position.
///
/// # Errors
/// * 400 Bad Request - `fen` missing, blank or malformed (no engine is started)
/// * 500 Internal Server Error - engine could not be started
/// * 502 Bad Gateway - engine exited without a best move
/// * 504 Gateway Timeout - engine did not finish in time
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;
    let fen = request
        .fen
        .filter(|fen| !fen.trim().is_empty())
        .ok_or(ApiError::MissingInput("fen"))?;

    let result = state.analyzer.analyze(&fen).await?;

    Ok(Json(AnalyzeResponse {
        best_move: result.best_move,
        evaluation: result.evaluation,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_request_deserialize() {
        let json = r#"{"fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"}"#;
        let request: AnalyzeRequest = serde_json::from_str(json).unwrap();
        assert!(request.fen.unwrap().starts_with("rnbqkbnr"));

        let empty: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.fen.is_none());
    }

    #[test]
    fn test_analyze_response_serialize() {
        let response = AnalyzeResponse {
            best_move: Some("e2e4".to_string()),
            evaluation: Some(-5),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"bestMove":"e2e4","evaluation":-5}"#);
    }

    #[test]
    fn test_absent_evaluation_serializes_as_null() {
        let response = AnalyzeResponse {
            best_move: Some("(none)".to_string()),
            evaluation: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"evaluation\":null"));
    }
}
