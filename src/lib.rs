//! Voice bridge server.
//!
//! Relays real-time microphone audio from a client WebSocket stream to an
//! Azure OpenAI realtime deployment behind an API management gateway, and
//! relays synthesized audio and transcripts back. The upstream performs
//! server-side voice activity detection and turn-taking; the bridge keeps a
//! clearable FIFO output queue so user interruptions drop stale audio.

pub mod config;
pub mod core;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use core::realtime::{
    BaseRealtime, ConnectionState, RealtimeConfig, RealtimeError, RealtimeResult,
};
pub use handlers::bridge::{BridgeOutput, BridgeSession, BridgeSettings};
pub use state::AppState;
