//! Azure OpenAI Realtime API provider.
//!
//! Speech-to-speech client for an Azure OpenAI realtime deployment reached
//! through an API management gateway. Audio flows both ways as 24kHz PCM16
//! over a single WebSocket; the server performs voice activity detection
//! and turn-taking.

pub mod client;
pub mod config;
pub mod messages;

pub use client::AzureRealtime;
pub use config::{AZURE_REALTIME_SAMPLE_RATE, AzureRealtimeVoice, build_realtime_url};
pub use messages::{ClientEvent, ServerEvent, SessionConfig};
