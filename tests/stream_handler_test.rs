//! Integration tests for the stream WebSocket handler.
//!
//! Runs the real router on a local listener. The configured gateway points
//! at an unreachable port, so session startup fails immediately and the
//! handler's failure path is exercised end to end over a live socket.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use voice_bridge::config::ServerConfig;
use voice_bridge::routes::create_bridge_router;
use voice_bridge::state::AppState;

fn unreachable_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        gateway_url: "http://127.0.0.1:1".to_string(),
        deployment: "gpt-4o-realtime-preview".to_string(),
        api_key: "test_key".to_string(),
        api_version: "2024-10-01-preview".to_string(),
        voice: "shimmer".to_string(),
        instructions: "test".to_string(),
        transcription_model: "whisper-1".to_string(),
        vad_threshold: 0.4,
        vad_silence_ms: 600,
        welcome_on_connect: false,
        cors_allowed_origins: None,
    }
}

async fn spawn_server(config: ServerConfig) -> String {
    let app = Router::new()
        .merge(create_bridge_router())
        .with_state(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    format!("ws://{addr}/stream")
}

#[tokio::test]
async fn test_startup_failure_sends_error_then_closing_then_close() {
    let url = spawn_server(unreachable_config()).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("WebSocket handshake failed");

    let mut message_types = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timed out waiting for server message");
        match next {
            Some(Ok(Message::Text(text))) => {
                let value: serde_json::Value =
                    serde_json::from_str(&text).expect("Invalid JSON from server");
                message_types.push(value["type"].as_str().unwrap_or_default().to_string());
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => panic!("WebSocket error: {e}"),
        }
    }

    assert_eq!(message_types, vec!["error", "closing"]);
}
