//! Shared application state.

use crate::config::ServerConfig;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}
