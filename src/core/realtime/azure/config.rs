//! Azure OpenAI Realtime API configuration types.
//!
//! Endpoint construction and voice selection for Azure-hosted realtime
//! deployments. The WebSocket endpoint is derived from the API gateway URL:
//! `{gateway}/inference/openai/realtime?api-version=...&deployment=...`
//! with the scheme rewritten to `wss` (or `ws` for plain http gateways).

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::realtime::base::{RealtimeError, RealtimeResult};

/// Audio sample rate used by the realtime API (Hz).
pub const AZURE_REALTIME_SAMPLE_RATE: u32 = 24000;

/// Path of the inference endpoint under the API gateway.
pub const AZURE_INFERENCE_PATH: &str = "/inference";

/// Path of the realtime WebSocket endpoint under the inference endpoint.
pub const AZURE_REALTIME_PATH: &str = "/openai/realtime";

/// Build the realtime WebSocket URL for a deployment behind an API gateway.
///
/// # Errors
///
/// Returns `RealtimeError::InvalidConfiguration` when the gateway URL cannot
/// be parsed or uses a scheme other than http(s)/ws(s).
pub fn build_realtime_url(
    gateway_url: &str,
    deployment: &str,
    api_version: &str,
) -> RealtimeResult<Url> {
    let mut url = Url::parse(gateway_url).map_err(|e| {
        RealtimeError::InvalidConfiguration(format!("Invalid gateway URL '{gateway_url}': {e}"))
    })?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "Unsupported gateway URL scheme: {other}"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| RealtimeError::InvalidConfiguration("Cannot set URL scheme".to_string()))?;

    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!(
        "{base_path}{AZURE_INFERENCE_PATH}{AZURE_REALTIME_PATH}"
    ));

    url.query_pairs_mut()
        .append_pair("api-version", api_version)
        .append_pair("deployment", deployment);

    Ok(url)
}

// =============================================================================
// Voices
// =============================================================================

/// Available voices for the Azure OpenAI Realtime API.
///
/// Same voice set as the OpenAI TTS API. The bridge defaults to `shimmer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AzureRealtimeVoice {
    /// Alloy voice
    Alloy,
    /// Ash voice
    Ash,
    /// Ballad voice
    Ballad,
    /// Coral voice
    Coral,
    /// Echo voice
    Echo,
    /// Sage voice
    Sage,
    /// Shimmer voice (default)
    #[default]
    Shimmer,
    /// Verse voice
    Verse,
}

impl AzureRealtimeVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "alloy" => Self::Alloy,
            "ash" => Self::Ash,
            "ballad" => Self::Ballad,
            "coral" => Self::Coral,
            "echo" => Self::Echo,
            "sage" => Self::Sage,
            "shimmer" => Self::Shimmer,
            "verse" => Self::Verse,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for AzureRealtimeVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
