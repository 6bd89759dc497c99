//! Message types for the client-facing bridge WebSocket.
//!
//! Microphone audio arrives as binary frames (PCM 16-bit, 24kHz, mono) and
//! never appears here. Text frames carry the JSON control messages below.
//! Synthesized audio flows back to the client as binary frames; everything
//! else (transcripts, speech events, errors) as JSON text frames.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Maximum accepted length for an injected text message (bytes).
pub const MAX_TEXT_SIZE: usize = 4096;

// =============================================================================
// Incoming (client -> bridge)
// =============================================================================

/// Control messages received from the client over text frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeIncomingMessage {
    /// Inject a text message into the conversation
    Text {
        /// Message text
        text: String,
    },
    /// Ask the model to generate a response
    CreateResponse,
    /// Clear the upstream input audio buffer
    ClearAudio,
}

impl BridgeIncomingMessage {
    /// Validate message contents.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BridgeIncomingMessage::Text { text } => {
                if text.is_empty() {
                    return Err("Text message cannot be empty".to_string());
                }
                if text.len() > MAX_TEXT_SIZE {
                    return Err(format!(
                        "Text message too large: {} bytes (max {})",
                        text.len(),
                        MAX_TEXT_SIZE
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Outgoing (bridge -> client)
// =============================================================================

/// Messages sent to the client over text frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeOutgoingMessage {
    /// Session established and upstream connected
    SessionReady {
        /// Bridge session identifier
        session_id: String,
        /// Deployment serving the session
        deployment: String,
        /// Active voice
        voice: String,
    },
    /// Transcript of user or assistant speech
    Transcript {
        /// Transcript text
        text: String,
        /// Speaker role
        role: String,
        /// Whether this is a final transcript
        is_final: bool,
    },
    /// Voice activity detection event
    SpeechEvent {
        /// "started" or "stopped"
        event: String,
        /// Audio timestamp in milliseconds
        audio_ms: u64,
    },
    /// Model finished generating a response
    ResponseDone {
        /// Response identifier
        response_id: String,
    },
    /// Error report
    Error {
        /// Error code
        code: String,
        /// Human-readable message
        message: String,
    },
    /// Session is shutting down
    Closing {
        /// Reason for the shutdown
        reason: String,
    },
}

/// Routed output for the socket sender task.
///
/// The emitter maps bridge output onto these routes; the sender task turns
/// them into WebSocket frames.
#[derive(Debug)]
pub enum BridgeMessageRoute {
    /// JSON control message, sent as a text frame
    Outgoing(BridgeOutgoingMessage),
    /// Synthesized audio, sent as a binary frame
    Audio(Bytes),
    /// Close the socket
    Close,
}
