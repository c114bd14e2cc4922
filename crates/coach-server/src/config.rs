//! Server configuration.
//!
//! Values are resolved in three layers: built-in defaults, an optional TOML
//! file (`coach.toml` in the working directory unless a path is given), and
//! finally environment variables, which win.

use engine_session::{EngineConfig, DEFAULT_DEPTH};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uci::Handshake;

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A setting has a value that cannot be used.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Engine settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineSection {
    /// Path to the UCI engine. Defaults to "stockfish" (assumes it's in PATH).
    #[serde(default = "default_engine_path")]
    pub path: String,
    /// Extra arguments passed to the engine executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Fixed search depth for every analysis.
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// One of "minimal", "new-game", "new-game-ready".
    #[serde(default = "default_handshake")]
    pub handshake: String,
    /// Per-analysis deadline in seconds. Unset means no deadline.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Maximum engines running at once. Unset means unbounded.
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            path: default_engine_path(),
            args: Vec::new(),
            depth: default_depth(),
            handshake: default_handshake(),
            timeout_secs: None,
            max_concurrent: None,
        }
    }
}

fn default_engine_path() -> String {
    "stockfish".to_string()
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

fn default_handshake() -> String {
    Handshake::default().as_str().to_string()
}

/// Text-generation API settings.
#[derive(Deserialize, Serialize, Clone)]
pub struct CommentarySection {
    /// API credential. Without it every explanation is the fallback text.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name sent with each request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_commentary_timeout")]
    pub timeout_secs: u64,
}

impl Default for CommentarySection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_commentary_timeout(),
        }
    }
}

impl std::fmt::Debug for CommentarySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentarySection")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_commentary_timeout() -> u64 {
    30
}

/// Main server configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Address to bind. Defaults to 127.0.0.1.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    /// Port to listen on. Defaults to 3000.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub commentary: CommentarySection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            engine: EngineSection::default(),
            commentary: CommentarySection::default(),
        }
    }
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    3000
}

impl ServerConfig {
    /// Loads configuration from file and process environment.
    ///
    /// With `path`, that file must exist. Without it, `coach.toml` is read
    /// if present and defaults are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// [`ConfigError::ParseError`] if it contains invalid TOML, or
    /// [`ConfigError::InvalidValue`] for unusable environment values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.engine_config()?;
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn config_path() -> PathBuf {
        PathBuf::from("coach.toml")
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay environment variables read through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BIND_ADDR") {
            self.bind = parse_value("BIND_ADDR", &v)?;
        }
        if let Some(v) = get("PORT") {
            self.port = parse_value("PORT", &v)?;
        }
        if let Some(v) = get("STOCKFISH_PATH") {
            self.engine.path = v;
        }
        if let Some(v) = get("ENGINE_DEPTH") {
            self.engine.depth = parse_value("ENGINE_DEPTH", &v)?;
        }
        if let Some(v) = get("ENGINE_HANDSHAKE") {
            self.engine.handshake = v;
        }
        if let Some(v) = get("ENGINE_TIMEOUT_SECS") {
            self.engine.timeout_secs = Some(parse_value("ENGINE_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("ENGINE_MAX_CONCURRENT") {
            self.engine.max_concurrent = Some(parse_value("ENGINE_MAX_CONCURRENT", &v)?);
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.commentary.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.commentary.base_url = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.commentary.model = v;
        }
        Ok(())
    }

    /// Build the engine settings used by the analyzer.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let handshake: Handshake =
            self.engine
                .handshake
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "engine.handshake",
                    value: self.engine.handshake.clone(),
                })?;
        if self.engine.depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.depth",
                value: "0".to_string(),
            });
        }

        Ok(EngineConfig {
            path: PathBuf::from(&self.engine.path),
            args: self.engine.args.clone(),
            depth: self.engine.depth,
            handshake,
            timeout: self.engine.timeout_secs.map(Duration::from_secs),
            max_concurrent: self.engine.max_concurrent,
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
