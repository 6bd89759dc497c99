//! Voice bridge WebSocket handler.
//!
//! Relays microphone audio from a client stream to a realtime
//! speech-to-speech deployment and relays synthesized audio and transcripts
//! back. One `BridgeSession` per connection; output is serialized through a
//! clearable FIFO queue so user interruptions can drop stale audio.

pub mod chat;
pub mod handler;
pub mod messages;
pub mod queue;
pub mod session;

pub use handler::stream_handler;
pub use session::{BridgeOutput, BridgeSession, BridgeSettings};
