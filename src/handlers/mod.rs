//! HTTP and WebSocket request handlers.
//!
//! - `api` - health check endpoint
//! - `bridge` - voice bridge WebSocket (realtime speech-to-speech relay)

pub mod api;
pub mod bridge;

pub use bridge::stream_handler;
