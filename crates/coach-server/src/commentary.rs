//! Natural-language move commentary.
//!
//! A [`CommentaryGenerator`] renders a prompt for a move and hands it to a
//! [`TextGenerator`]. The generator is built once at startup and shared by
//! all requests. Any failure degrades to [`FALLBACK_EXPLANATION`]; callers
//! never see an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Returned whenever no usable explanation could be generated.
pub const FALLBACK_EXPLANATION: &str =
    "No explanation is available for this move right now. Try again later.";

/// Errors from the text-generation backend.
#[derive(Error, Debug)]
pub enum CommentaryError {
    /// No API credential is configured.
    #[error("Commentary is not configured")]
    NotConfigured,
    /// The HTTP request failed.
    #[error("Request to text-generation API failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("Text-generation API returned {0}")]
    Status(reqwest::StatusCode),
    /// The API answered without any text.
    #[error("Text-generation API returned no text")]
    EmptyResponse,
}

/// A prompt-in, text-out language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CommentaryError>;
}

/// Used when no API key is configured.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CommentaryError> {
        Err(CommentaryError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions API.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client for `{base_url}/chat/completions`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CommentaryError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, CommentaryError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: 300,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommentaryError::Status(status));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CommentaryError::EmptyResponse)
    }
}

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Accepts `w`/`b`/`white`/`black`, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "white" => Some(Side::White),
            "b" | "black" => Some(Side::Black),
            _ => None,
        }
    }

    /// Read the active-color field of a FEN.
    pub fn from_fen(fen: &str) -> Option<Self> {
        fen.split_whitespace().nth(1).and_then(Self::parse)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("White"),
            Side::Black => f.write_str("Black"),
        }
    }
}

/// Everything the prompt needs about one move.
#[derive(Debug, Clone)]
pub struct MoveContext {
    pub fen: String,
    pub mv: String,
    pub history: String,
    pub side: Side,
}

/// Render the prompt for `ctx`.
pub fn build_prompt(ctx: &MoveContext) -> String {
    let history = ctx.history.trim();
    let history = if history.is_empty() { "(none)" } else { history };
    format!(
        "You are a chess coach. In two or three sentences, explain to a club-level \
         player why {side} might play {mv} in this position, mentioning the main \
         threat or plan it creates.\n\
         Position (FEN): {fen}\n\
         Side to move: {side}\n\
         Moves so far: {history}\n\
         Candidate move: {mv}",
        side = ctx.side,
        mv = ctx.mv,
        fen = ctx.fen,
        history = history,
    )
}

/// Produces move explanations, falling back to a fixed text on any failure.
pub struct CommentaryGenerator {
    client: Arc<dyn TextGenerator>,
}

impl CommentaryGenerator {
    pub fn new(client: Arc<dyn TextGenerator>) -> Self {
        Self { client }
    }

    /// Explain a move. Never fails.
    pub async fn explain(&self, ctx: &MoveContext) -> String {
        let prompt = build_prompt(ctx);
        match self.client.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!(mv = %ctx.mv, "commentary was empty, using fallback");
                FALLBACK_EXPLANATION.to_string()
            }
            Err(CommentaryError::NotConfigured) => {
                tracing::debug!(mv = %ctx.mv, "commentary disabled, using fallback");
                FALLBACK_EXPLANATION.to_string()
            }
            Err(e) => {
                tracing::warn!(mv = %ctx.mv, error = %e, "commentary failed, using fallback");
                FALLBACK_EXPLANATION.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records prompts and replies with a canned result.
    struct Scripted {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, CommentaryError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().ok_or(CommentaryError::EmptyResponse)
        }
    }

    fn ctx() -> MoveContext {
        MoveContext {
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".to_string(),
            mv: "e7e5".to_string(),
            history: "e2e4".to_string(),
            side: Side::Black,
        }
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("w"), Some(Side::White));
        assert_eq!(Side::parse("BLACK"), Some(Side::Black));
        assert_eq!(Side::parse("red"), None);
        assert_eq!(Side::from_fen(&ctx().fen), Some(Side::Black));
        assert_eq!(Side::from_fen("8/8/8/8/8/8/8/8"), None);
        assert_eq!(Side::White.to_string(), "White");
    }

    #[test]
    fn test_prompt_mentions_everything() {
        let prompt = build_prompt(&ctx());
        assert!(prompt.contains("Black might play e7e5"));
        assert!(prompt.contains("Position (FEN): rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"));
        assert!(prompt.contains("Moves so far: e2e4"));
    }

    #[test]
    fn test_prompt_with_empty_history() {
        let mut ctx = ctx();
        ctx.history = "  ".to_string();
        assert!(build_prompt(&ctx).contains("Moves so far: (none)"));
    }

    #[tokio::test]
    async fn test_explain_trims_reply() {
        let client = Arc::new(Scripted {
            reply: Some("  Strikes at the centre.\n".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let generator = CommentaryGenerator::new(client.clone());

        let text = generator.explain(&ctx()).await;

        assert_eq!(text, "Strikes at the centre.");
        assert_eq!(client.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_explain_falls_back_on_error_and_empty_text() {
        let failing = CommentaryGenerator::new(Arc::new(Scripted {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }));
        assert_eq!(failing.explain(&ctx()).await, FALLBACK_EXPLANATION);

        let blank = CommentaryGenerator::new(Arc::new(Scripted {
            reply: Some("   ".to_string()),
            prompts: Mutex::new(Vec::new()),
        }));
        assert_eq!(blank.explain(&ctx()).await, FALLBACK_EXPLANATION);
    }

    #[tokio::test]
    async fn test_disabled_generator() {
        let generator = CommentaryGenerator::new(Arc::new(DisabledGenerator));
        assert_eq!(generator.explain(&ctx()).await, FALLBACK_EXPLANATION);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client =
            OpenAiClient::new("key", "http://localhost:8080/v1/", "model", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
