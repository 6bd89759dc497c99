//! Realtime speech-to-speech provider abstractions.
//!
//! `base` defines the provider-agnostic trait and shared types; `azure`
//! implements it for the Azure OpenAI Realtime API.

pub mod azure;
pub mod base;

pub use base::{
    BaseRealtime, BoxedRealtime, ConnectionState, RealtimeAudioData, RealtimeConfig,
    RealtimeError, RealtimeResult, SpeechEvent, TranscriptResult, TranscriptRole,
};
