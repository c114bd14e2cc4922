//! API error responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine_session::AnalysisError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned to HTTP clients as `{ "error": "<message>" }`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required request field is absent or blank.
    #[error("Missing required field: {0}")]
    MissingInput(&'static str),
    /// A request field has an unusable value.
    #[error("{0}")]
    InvalidInput(String),
    /// The request body is not the expected JSON.
    #[error("Invalid request body: {0}")]
    BadJson(#[from] JsonRejection),
    /// Engine analysis failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput(_) | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::BadJson(rejection) => rejection.status(),
            ApiError::Analysis(e) => match e {
                AnalysisError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                AnalysisError::SpawnFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AnalysisError::EngineCrashed(_) => StatusCode::BAD_GATEWAY,
                AnalysisError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                AnalysisError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_input_is_bad_request() {
        let err = ApiError::MissingInput("fen");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing required field: fen");
    }

    #[test]
    fn test_analysis_error_statuses() {
        let spawn = ApiError::from(AnalysisError::SpawnFailure(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        )));
        assert_eq!(spawn.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let crashed = ApiError::from(AnalysisError::EngineCrashed("exit status: 1".to_string()));
        assert_eq!(crashed.status(), StatusCode::BAD_GATEWAY);

        let timeout = ApiError::from(AnalysisError::Timeout(Duration::from_secs(1)));
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_error_body_serialize() {
        let body = ErrorBody {
            error: "Missing required field: fen".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Missing required field: fen"}"#);
    }

    #[tokio::test]
    async fn test_into_response_has_json_body() {
        let response = ApiError::MissingInput("move").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Missing required field: move");
    }
}
