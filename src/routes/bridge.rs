//! Bridge WebSocket route configuration.
//!
//! # Endpoint
//!
//! `GET /stream` - WebSocket upgrade for the voice bridge
//!
//! # Protocol
//!
//! After the upgrade, clients send binary audio frames (PCM 16-bit, 24kHz,
//! mono) and optional JSON control messages (`text`, `create_response`,
//! `clear_audio`).
//!
//! The server responds with:
//! - `session_ready` once the upstream connection is established
//! - `transcript` for user and assistant speech
//! - `speech_event` for voice activity detection
//! - binary audio frames carrying synthesized speech
//! - `error` on failures

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::bridge::stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the bridge WebSocket router.
pub fn create_bridge_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stream", get(stream_handler))
        .layer(TraceLayer::new_for_http())
}
