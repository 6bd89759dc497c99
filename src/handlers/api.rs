//! Health check endpoint.

use axum::Json;
use serde_json::{Value, json};

/// Health check handler.
///
/// Returns service name and version so load balancers and deploy checks can
/// verify the server is up.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "voice-bridge");
    }
}
