//! Server configuration.
//!
//! Configuration is loaded from environment variables, with a `.env` file
//! picked up before loading. The four upstream variables follow the names
//! used by the API management deployment:
//!
//! - `APIM_RESOURCE_GATEWAY_URL` - API gateway base URL
//! - `AZURE_OPENAI_DEPLOYMENT_NAME` - realtime model deployment
//! - `API_KEY` - gateway credential
//! - `AZURE_OPENAI_API_VERSION` - API version query parameter
//!
//! Everything else has a default and is optional.

use thiserror::Error;

use crate::handlers::bridge::session::{
    BridgeSettings, DEFAULT_INSTRUCTIONS, DEFAULT_TRANSCRIPTION_MODEL, DEFAULT_VAD_SILENCE_MS,
    DEFAULT_VAD_THRESHOLD, DEFAULT_VOICE,
};

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVariable(&'static str),

    /// A variable is present but cannot be parsed
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,

    /// API gateway base URL
    pub gateway_url: String,
    /// Realtime model deployment name
    pub deployment: String,
    /// Gateway credential
    pub api_key: String,
    /// API version
    pub api_version: String,

    /// Voice for synthesized output
    pub voice: String,
    /// Assistant instructions
    pub instructions: String,
    /// Input transcription model
    pub transcription_model: String,
    /// VAD activation threshold
    pub vad_threshold: f32,
    /// VAD end-of-turn silence duration (ms)
    pub vad_silence_ms: u32,
    /// Send a welcome prompt when a session connects
    pub welcome_on_connect: bool,

    /// CORS allowed origins (comma-separated list or "*" for all).
    /// None means same-origin only.
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            host: env_or("HOST", DEFAULT_HOST),
            port: parse_env("PORT", DEFAULT_PORT)?,

            gateway_url: require_env("APIM_RESOURCE_GATEWAY_URL")?,
            deployment: require_env("AZURE_OPENAI_DEPLOYMENT_NAME")?,
            api_key: require_env("API_KEY")?,
            api_version: require_env("AZURE_OPENAI_API_VERSION")?,

            voice: env_or("BRIDGE_VOICE", DEFAULT_VOICE),
            instructions: env_or("BRIDGE_INSTRUCTIONS", DEFAULT_INSTRUCTIONS),
            transcription_model: env_or(
                "BRIDGE_TRANSCRIPTION_MODEL",
                DEFAULT_TRANSCRIPTION_MODEL,
            ),
            vad_threshold: parse_env("BRIDGE_VAD_THRESHOLD", DEFAULT_VAD_THRESHOLD)?,
            vad_silence_ms: parse_env("BRIDGE_VAD_SILENCE_MS", DEFAULT_VAD_SILENCE_MS)?,
            welcome_on_connect: parse_env("BRIDGE_WELCOME", false)?,

            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.vad_threshold) {
            return Err(ConfigError::InvalidValue {
                name: "BRIDGE_VAD_THRESHOLD",
                reason: format!("{} is outside 0.0..=1.0", self.vad_threshold),
            });
        }
        if url::Url::parse(&self.gateway_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "APIM_RESOURCE_GATEWAY_URL",
                reason: format!("'{}' is not a valid URL", self.gateway_url),
            });
        }
        Ok(())
    }

    /// The socket address string to bind to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for a new bridge session.
    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            gateway_url: self.gateway_url.clone(),
            deployment: self.deployment.clone(),
            api_key: self.api_key.clone(),
            api_version: self.api_version.clone(),
            voice: self.voice.clone(),
            instructions: self.instructions.clone(),
            transcription_model: self.transcription_model.clone(),
            vad_threshold: self.vad_threshold,
            vad_silence_ms: self.vad_silence_ms,
            welcome_on_connect: self.welcome_on_connect,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn require_env(name: &'static str) -> ConfigResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVariable(name)),
    }
}

fn parse_env<T>(name: &'static str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
