//! Base trait and types for realtime speech-to-speech providers.
//!
//! The bridge talks to exactly one kind of upstream: a cloud realtime
//! conversation API with server-side voice activity detection. This module
//! defines the provider abstraction the bridge session is written against.
//!
//! # Audio Format
//!
//! All audio is PCM 16-bit signed little-endian at 24kHz, mono.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during realtime operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// Session error
    #[error("Session error: {0}")]
    SessionError(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Configuration Types
// =============================================================================

/// Configuration for a realtime session against an Azure OpenAI deployment.
///
/// The endpoint fields mirror the four environment variables the server is
/// configured with: gateway URL, deployment name, credential and API version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// API gateway base URL (the inference endpoint lives under it)
    pub gateway_url: String,

    /// Realtime model deployment name
    pub deployment: String,

    /// API key sent as the `api-key` header
    pub api_key: String,

    /// API version query parameter
    pub api_version: String,

    /// Voice for synthesized audio output
    #[serde(default)]
    pub voice: Option<String>,

    /// System instructions for the assistant
    #[serde(default)]
    pub instructions: Option<String>,

    /// Response modalities (text, audio, or both)
    #[serde(default)]
    pub modalities: Option<Vec<String>>,

    /// Enable input audio transcription
    #[serde(default)]
    pub input_audio_transcription: Option<InputTranscriptionConfig>,

    /// Turn detection configuration
    #[serde(default)]
    pub turn_detection: Option<TurnDetectionConfig>,
}

/// Configuration for input audio transcription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputTranscriptionConfig {
    /// Model to use for transcription (e.g., "whisper-1")
    pub model: String,
}

/// Configuration for turn detection (VAD).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetectionConfig {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        /// Activation threshold (0.0 to 1.0)
        #[serde(default)]
        threshold: Option<f32>,
        /// Amount of audio to include before voice detection (ms)
        #[serde(default)]
        prefix_padding_ms: Option<u32>,
        /// Silence duration before end of turn (ms)
        #[serde(default)]
        silence_duration_ms: Option<u32>,
    },
    /// No automatic turn detection
    #[serde(rename = "none")]
    None,
}

impl Default for TurnDetectionConfig {
    fn default() -> Self {
        TurnDetectionConfig::ServerVad {
            threshold: Some(0.5),
            prefix_padding_ms: Some(300),
            silence_duration_ms: Some(500),
        }
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Connection state for realtime providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected to the provider
    #[default]
    Disconnected,
    /// Currently connecting
    Connecting,
    /// Connected and ready
    Connected,
    /// Connection failed
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

// =============================================================================
// Event Payloads
// =============================================================================

/// Transcript result from realtime transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// The transcribed text
    pub text: String,
    /// Role of the speaker (user or assistant)
    pub role: TranscriptRole,
    /// Whether this is a final transcript
    pub is_final: bool,
    /// Item ID from the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// Role of the speaker in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    /// User speech transcript
    User,
    /// Assistant speech transcript
    Assistant,
}

impl fmt::Display for TranscriptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptRole::User => write!(f, "user"),
            TranscriptRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Audio data from realtime synthesis.
#[derive(Debug, Clone)]
pub struct RealtimeAudioData {
    /// Raw audio bytes (PCM 16-bit, 24kHz, mono, little-endian)
    pub data: Bytes,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Item ID from the provider
    pub item_id: Option<String>,
    /// Response ID from the provider
    pub response_id: Option<String>,
}

/// Speech events (VAD events).
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    /// Speech started detection
    Started {
        /// Audio timestamp in milliseconds
        audio_start_ms: u64,
        /// Item ID
        item_id: Option<String>,
    },
    /// Speech stopped detection
    Stopped {
        /// Audio timestamp in milliseconds
        audio_end_ms: u64,
        /// Item ID
        item_id: Option<String>,
    },
}

// =============================================================================
// Callback Types
// =============================================================================

/// Callback type for transcript events.
pub type TranscriptCallback =
    Arc<dyn Fn(TranscriptResult) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for audio output events.
pub type AudioOutputCallback =
    Arc<dyn Fn(RealtimeAudioData) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for error events.
pub type RealtimeErrorCallback =
    Arc<dyn Fn(RealtimeError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for speech events (VAD).
pub type SpeechEventCallback =
    Arc<dyn Fn(SpeechEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for response completion.
pub type ResponseDoneCallback =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

// =============================================================================
// Base Trait
// =============================================================================

/// Base trait for realtime speech-to-speech providers.
///
/// A provider owns a single upstream connection for the lifetime of a bridge
/// session. Connection loss ends the session; there is no automatic
/// reconnection.
#[async_trait]
pub trait BaseRealtime: Send + Sync {
    /// Create a new realtime provider instance.
    fn new(config: RealtimeConfig) -> RealtimeResult<Self>
    where
        Self: Sized;

    /// Connect to the realtime provider.
    async fn connect(&mut self) -> RealtimeResult<()>;

    /// Disconnect from the realtime provider. Idempotent.
    async fn disconnect(&mut self) -> RealtimeResult<()>;

    /// Check if the provider is connected and ready.
    fn is_ready(&self) -> bool;

    /// Get the current connection state.
    fn get_connection_state(&self) -> ConnectionState;

    // -------------------------------------------------------------------------
    // Audio I/O
    // -------------------------------------------------------------------------

    /// Send audio data to the provider.
    ///
    /// Audio should be PCM 16-bit, 24kHz, mono, little-endian.
    async fn send_audio(&mut self, audio_data: Bytes) -> RealtimeResult<()>;

    /// Send a text message to the conversation.
    async fn send_text(&mut self, text: &str) -> RealtimeResult<()>;

    // -------------------------------------------------------------------------
    // Session Control
    // -------------------------------------------------------------------------

    /// Request the model to generate a response.
    async fn create_response(&mut self) -> RealtimeResult<()>;

    /// Cancel the current response generation.
    async fn cancel_response(&mut self) -> RealtimeResult<()>;

    /// Commit the audio buffer (for manual turn detection).
    async fn commit_audio_buffer(&mut self) -> RealtimeResult<()>;

    /// Clear the audio buffer.
    async fn clear_audio_buffer(&mut self) -> RealtimeResult<()>;

    /// Update the session configuration.
    async fn update_session(&mut self, config: RealtimeConfig) -> RealtimeResult<()>;

    // -------------------------------------------------------------------------
    // Callbacks
    // -------------------------------------------------------------------------

    /// Register a callback for transcript events.
    fn on_transcript(&mut self, callback: TranscriptCallback) -> RealtimeResult<()>;

    /// Register a callback for audio output events.
    fn on_audio(&mut self, callback: AudioOutputCallback) -> RealtimeResult<()>;

    /// Register a callback for error events.
    fn on_error(&mut self, callback: RealtimeErrorCallback) -> RealtimeResult<()>;

    /// Register a callback for speech events (VAD).
    fn on_speech_event(&mut self, callback: SpeechEventCallback) -> RealtimeResult<()>;

    /// Register a callback for response completion.
    fn on_response_done(&mut self, callback: ResponseDoneCallback) -> RealtimeResult<()>;
}

/// Boxed trait object for realtime providers.
pub type BoxedRealtime = Box<dyn BaseRealtime>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(ConnectionState::Connecting.to_string(), "Connecting");
    }

    #[test]
    fn test_transcript_role_display() {
        assert_eq!(TranscriptRole::User.to_string(), "user");
        assert_eq!(TranscriptRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_default_config() {
        let config = RealtimeConfig::default();
        assert!(config.api_key.is_empty());
        assert!(config.gateway_url.is_empty());
        assert!(config.voice.is_none());
    }

    #[test]
    fn test_default_turn_detection() {
        let td = TurnDetectionConfig::default();
        match td {
            TurnDetectionConfig::ServerVad { threshold, .. } => {
                assert_eq!(threshold, Some(0.5));
            }
            _ => panic!("Expected ServerVad default"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = RealtimeError::ConnectionFailed("test".to_string());
        assert!(err.to_string().contains("Connection failed"));

        let err = RealtimeError::NotConnected;
        assert_eq!(err.to_string(), "Not connected");
    }

    #[test]
    fn test_turn_detection_serialization() {
        let td = TurnDetectionConfig::ServerVad {
            threshold: Some(0.4),
            prefix_padding_ms: None,
            silence_duration_ms: Some(600),
        };
        let json = serde_json::to_string(&td).unwrap();
        assert!(json.contains(r#""type":"server_vad""#));
        assert!(json.contains("0.4"));
        assert!(json.contains("600"));
    }
}
