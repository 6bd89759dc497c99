//! Bridge session tying a client stream to a realtime provider.
//!
//! One session per client connection. Microphone frames flow in through
//! [`BridgeSession::receive`]; provider callbacks and control responses land
//! on a shared FIFO queue drained by [`BridgeSession::emit`]. Session state
//! is interior-mutable so the session can be shared between the socket
//! receive loop and the emitter task behind an `Arc`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::core::realtime::azure::AzureRealtime;
use crate::core::realtime::base::{
    BaseRealtime, BoxedRealtime, InputTranscriptionConfig, RealtimeAudioData, RealtimeConfig,
    RealtimeError, RealtimeResult, SpeechEvent, TranscriptResult, TurnDetectionConfig,
};

use super::chat::{ChatLog, ChatMessage};
use super::queue::OutputQueue;

/// Default voice for synthesized output.
pub const DEFAULT_VOICE: &str = "shimmer";

/// Default input transcription model.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Default VAD activation threshold.
pub const DEFAULT_VAD_THRESHOLD: f32 = 0.4;

/// Default VAD end-of-turn silence duration (ms).
pub const DEFAULT_VAD_SILENCE_MS: u32 = 600;

/// Default assistant instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "Your name is Amy. You're a helpful agent who responds \
    initially with a clam British accent, but also can speak in any language as the user chooses \
    to. Always start the conversation with a cheery hello";

/// Text injected by the welcome flow.
const WELCOME_PROMPT: &str = "what's your name?";

// =============================================================================
// Settings
// =============================================================================

/// Settings for a bridge session.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// API gateway base URL
    pub gateway_url: String,
    /// Realtime deployment name
    pub deployment: String,
    /// API key
    pub api_key: String,
    /// API version
    pub api_version: String,
    /// Voice for synthesized output
    pub voice: String,
    /// Assistant instructions
    pub instructions: String,
    /// Input transcription model
    pub transcription_model: String,
    /// VAD activation threshold
    pub vad_threshold: f32,
    /// VAD end-of-turn silence duration (ms)
    pub vad_silence_ms: u32,
    /// Kick off the conversation as soon as the session is up
    pub welcome_on_connect: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            deployment: String::new(),
            api_key: String::new(),
            api_version: String::new(),
            voice: DEFAULT_VOICE.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            vad_threshold: DEFAULT_VAD_THRESHOLD,
            vad_silence_ms: DEFAULT_VAD_SILENCE_MS,
            welcome_on_connect: false,
        }
    }
}

impl BridgeSettings {
    /// Build the provider configuration for this session.
    ///
    /// Both modalities are requested; text alone would suppress the
    /// synthesized audio the bridge exists to relay.
    pub fn realtime_config(&self) -> RealtimeConfig {
        RealtimeConfig {
            gateway_url: self.gateway_url.clone(),
            deployment: self.deployment.clone(),
            api_key: self.api_key.clone(),
            api_version: self.api_version.clone(),
            voice: Some(self.voice.clone()),
            instructions: Some(self.instructions.clone()),
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            input_audio_transcription: Some(InputTranscriptionConfig {
                model: self.transcription_model.clone(),
            }),
            turn_detection: Some(TurnDetectionConfig::ServerVad {
                threshold: Some(self.vad_threshold),
                prefix_padding_ms: None,
                silence_duration_ms: Some(self.vad_silence_ms),
            }),
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// An item queued for delivery to the client.
#[derive(Debug, Clone)]
pub enum BridgeOutput {
    /// Synthesized audio chunk
    Audio(RealtimeAudioData),
    /// User or assistant transcript
    Transcript(TranscriptResult),
    /// Voice activity detection event
    Speech(SpeechEvent),
    /// Response generation finished
    ResponseDone(String),
    /// Upstream error
    Error(String),
}

// =============================================================================
// Session
// =============================================================================

/// A single voice bridge session.
pub struct BridgeSession {
    settings: BridgeSettings,
    realtime: Mutex<Option<BoxedRealtime>>,
    queue: OutputQueue<BridgeOutput>,
    chat: ChatLog,
    shutdown: AtomicBool,
}

impl BridgeSession {
    /// Create a session. No upstream connection is made until
    /// [`start_up`](Self::start_up).
    pub fn new(settings: BridgeSettings) -> Self {
        Self {
            settings,
            realtime: Mutex::new(None),
            queue: OutputQueue::new(),
            chat: ChatLog::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Settings this session was created with.
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Connect to the realtime provider and wire its callbacks into the
    /// output queue.
    pub async fn start_up(self: Arc<Self>) -> RealtimeResult<()> {
        let mut guard = self.realtime.lock().await;
        if guard.is_some() {
            return Err(RealtimeError::SessionError(
                "Session already started".to_string(),
            ));
        }

        let mut provider = AzureRealtime::new(self.settings.realtime_config())?;

        let session = Arc::clone(&self);
        provider.on_transcript(Arc::new(move |transcript| {
            let session = Arc::clone(&session);
            Box::pin(async move {
                session.ingest_transcript(transcript).await;
            })
        }))?;

        let session = Arc::clone(&self);
        provider.on_audio(Arc::new(move |audio| {
            let session = Arc::clone(&session);
            Box::pin(async move {
                session.ingest_audio(audio).await;
            })
        }))?;

        let session = Arc::clone(&self);
        provider.on_speech_event(Arc::new(move |event| {
            let session = Arc::clone(&session);
            Box::pin(async move {
                session.ingest_speech(event).await;
            })
        }))?;

        let session = Arc::clone(&self);
        provider.on_response_done(Arc::new(move |response_id| {
            let session = Arc::clone(&session);
            Box::pin(async move {
                session.ingest_response_done(response_id).await;
            })
        }))?;

        let session = Arc::clone(&self);
        provider.on_error(Arc::new(move |error| {
            let session = Arc::clone(&session);
            Box::pin(async move {
                session.ingest_error(error.to_string()).await;
            })
        }))?;

        provider.connect().await?;
        *guard = Some(Box::new(provider));

        tracing::info!(deployment = %self.settings.deployment, "Bridge session started");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inbound audio
    // -------------------------------------------------------------------------

    /// Relay a microphone frame upstream.
    ///
    /// Frames arriving before the session is started, or after the upstream
    /// connection is gone, are dropped silently. Audio before establishment
    /// is expected during stream setup and is not an error.
    pub async fn receive(&self, frame: Bytes) -> RealtimeResult<()> {
        let mut guard = self.realtime.lock().await;
        match guard.as_mut() {
            Some(provider) if provider.is_ready() => provider.send_audio(frame).await,
            _ => {
                tracing::trace!("Dropping audio frame: no upstream connection");
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Outbound queue
    // -------------------------------------------------------------------------

    /// Wait for the next output item.
    pub async fn emit(&self) -> BridgeOutput {
        self.queue.pop().await
    }

    /// Return the next output item if one is queued.
    pub async fn try_emit(&self) -> Option<BridgeOutput> {
        self.queue.try_pop().await
    }

    /// Number of items waiting for the emitter.
    pub async fn pending_outputs(&self) -> usize {
        self.queue.len().await
    }

    // -------------------------------------------------------------------------
    // Provider event ingestion
    // -------------------------------------------------------------------------

    /// Record a transcript and queue it for the client.
    pub async fn ingest_transcript(&self, transcript: TranscriptResult) {
        self.chat.apply(&transcript).await;
        self.queue.push(BridgeOutput::Transcript(transcript)).await;
    }

    /// Queue a synthesized audio chunk.
    pub async fn ingest_audio(&self, audio: RealtimeAudioData) {
        self.queue.push(BridgeOutput::Audio(audio)).await;
    }

    /// Queue a speech event.
    ///
    /// Speech start means the user is interrupting: pending output is stale
    /// and gets dropped before the event is queued.
    pub async fn ingest_speech(&self, event: SpeechEvent) {
        if matches!(event, SpeechEvent::Started { .. }) {
            self.queue.clear().await;
        }
        self.queue.push(BridgeOutput::Speech(event)).await;
    }

    /// Queue a response completion.
    pub async fn ingest_response_done(&self, response_id: String) {
        self.queue.push(BridgeOutput::ResponseDone(response_id)).await;
    }

    /// Queue an upstream error report.
    pub async fn ingest_error(&self, message: String) {
        self.queue.push(BridgeOutput::Error(message)).await;
    }

    // -------------------------------------------------------------------------
    // Control
    // -------------------------------------------------------------------------

    /// Inject a user text message into the conversation.
    pub async fn send_text(&self, text: &str) -> RealtimeResult<()> {
        let mut guard = self.realtime.lock().await;
        match guard.as_mut() {
            Some(provider) => provider.send_text(text).await,
            None => Err(RealtimeError::NotConnected),
        }
    }

    /// Ask the model to generate a response.
    pub async fn create_response(&self) -> RealtimeResult<()> {
        let mut guard = self.realtime.lock().await;
        match guard.as_mut() {
            Some(provider) => provider.create_response().await,
            None => Err(RealtimeError::NotConnected),
        }
    }

    /// Clear the upstream input audio buffer.
    pub async fn clear_audio(&self) -> RealtimeResult<()> {
        let mut guard = self.realtime.lock().await;
        match guard.as_mut() {
            Some(provider) => provider.clear_audio_buffer().await,
            None => Err(RealtimeError::NotConnected),
        }
    }

    /// Kick off the conversation by asking the assistant to introduce itself.
    pub async fn welcome(&self) -> RealtimeResult<()> {
        self.send_text(WELCOME_PROMPT).await?;
        self.create_response().await
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Whether the upstream connection is established.
    pub async fn is_connected(&self) -> bool {
        self.realtime
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| p.is_ready())
    }

    /// Conversation history so far.
    pub async fn chat_snapshot(&self) -> Vec<ChatMessage> {
        self.chat.snapshot().await
    }

    /// Tear the session down. Safe to call more than once.
    pub async fn shutdown(&self) -> RealtimeResult<()> {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(mut provider) = self.realtime.lock().await.take() {
            provider.disconnect().await?;
        }
        self.queue.clear().await;

        tracing::info!("Bridge session shut down");
        Ok(())
    }
}
