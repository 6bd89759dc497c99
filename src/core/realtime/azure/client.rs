//! Azure OpenAI Realtime API client implementation.
//!
//! Implements the `BaseRealtime` trait over the WebSocket-based realtime
//! protocol exposed by an Azure OpenAI deployment behind an API gateway.
//!
//! # API Reference
//!
//! - Endpoint: `wss://{gateway}/inference/openai/realtime?api-version=<v>&deployment=<d>`
//! - Protocol: WebSocket with JSON events
//! - Auth: `api-key` header
//! - Audio: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};

use super::config::{AZURE_REALTIME_SAMPLE_RATE, AzureRealtimeVoice, build_realtime_url};
use super::messages::{
    ClientEvent, ConversationItem, InputAudioTranscription, ServerEvent, SessionConfig,
    TurnDetection,
};
use crate::core::realtime::base::{
    AudioOutputCallback, BaseRealtime, ConnectionState, RealtimeAudioData, RealtimeConfig,
    RealtimeError, RealtimeErrorCallback, RealtimeResult, ResponseDoneCallback, SpeechEvent,
    SpeechEventCallback, TranscriptCallback, TranscriptResult, TranscriptRole,
};

/// Channel capacity for WebSocket message sending.
const WS_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Azure Realtime Client
// =============================================================================

/// Azure OpenAI Realtime API client.
///
/// Owns the upstream WebSocket for the lifetime of a bridge session and
/// dispatches server events to registered callbacks.
///
/// # Thread Safety
///
/// Mutable state is wrapped in `Arc` so it can be shared with the spawned
/// connection task. The `connected` flag uses `Arc<AtomicBool>` for
/// lock-free status checks.
///
/// # Failure Model
///
/// There is no reconnection: when the socket closes or errors, the
/// connection task fires the error callback (unless the disconnect was
/// requested) and ends. The owner is expected to tear the session down.
pub struct AzureRealtime {
    /// Configuration
    config: RealtimeConfig,
    /// Parsed voice
    voice: AzureRealtimeVoice,
    /// Connection state, readable from sync context
    state: Arc<std::sync::RwLock<ConnectionState>>,
    /// Connected flag shared with the connection task
    connected: Arc<AtomicBool>,
    /// Session ID assigned by the server
    session_id: Arc<RwLock<Option<String>>>,
    /// Flag to indicate intentional disconnection
    intentional_disconnect: Arc<AtomicBool>,

    /// WebSocket sender channel
    ws_sender: Arc<Mutex<Option<mpsc::Sender<ClientEvent>>>>,

    /// Callbacks
    transcript_callback: Arc<Mutex<Option<TranscriptCallback>>>,
    audio_callback: Arc<Mutex<Option<AudioOutputCallback>>>,
    error_callback: Arc<Mutex<Option<RealtimeErrorCallback>>>,
    speech_event_callback: Arc<Mutex<Option<SpeechEventCallback>>>,
    response_done_callback: Arc<Mutex<Option<ResponseDoneCallback>>>,

    /// Connection task handle
    connection_handle: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Accumulated transcript for the in-flight assistant response
    assistant_transcript: Arc<RwLock<String>>,
}

impl std::fmt::Debug for AzureRealtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureRealtime")
            .field("config", &self.config)
            .field("voice", &self.voice)
            .field("connected", &self.connected)
            .field("intentional_disconnect", &self.intentional_disconnect)
            .finish_non_exhaustive()
    }
}

/// Store a connection state, recovering the guard if a writer panicked.
fn store_state(state: &std::sync::RwLock<ConnectionState>, value: ConnectionState) {
    match state.write() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}

impl AzureRealtime {
    /// Get the configured voice.
    pub fn voice(&self) -> AzureRealtimeVoice {
        self.voice
    }

    /// Get the session ID if connected.
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    /// Build the initial session configuration.
    fn build_session_config(&self) -> SessionConfig {
        SessionConfig {
            modalities: self
                .config
                .modalities
                .clone()
                .or_else(|| Some(vec!["text".to_string(), "audio".to_string()])),
            voice: Some(self.voice.as_str().to_string()),
            instructions: self.config.instructions.clone(),
            input_audio_format: Some("pcm16".to_string()),
            output_audio_format: Some("pcm16".to_string()),
            input_audio_transcription: self.config.input_audio_transcription.as_ref().map(|t| {
                InputAudioTranscription {
                    model: t.model.clone(),
                }
            }),
            turn_detection: self.config.turn_detection.as_ref().map(|td| match td {
                crate::core::realtime::base::TurnDetectionConfig::ServerVad {
                    threshold,
                    prefix_padding_ms,
                    silence_duration_ms,
                } => TurnDetection::ServerVad {
                    threshold: *threshold,
                    prefix_padding_ms: *prefix_padding_ms,
                    silence_duration_ms: *silence_duration_ms,
                },
                crate::core::realtime::base::TurnDetectionConfig::None => TurnDetection::None {},
            }),
        }
    }

    /// Handle a server event.
    ///
    /// Processes incoming WebSocket events from the realtime API and
    /// dispatches them to the appropriate callbacks.
    async fn handle_server_event(
        event: ServerEvent,
        transcript_cb: &Arc<Mutex<Option<TranscriptCallback>>>,
        audio_cb: &Arc<Mutex<Option<AudioOutputCallback>>>,
        error_cb: &Arc<Mutex<Option<RealtimeErrorCallback>>>,
        speech_event_cb: &Arc<Mutex<Option<SpeechEventCallback>>>,
        response_done_cb: &Arc<Mutex<Option<ResponseDoneCallback>>>,
        session_id: &Arc<RwLock<Option<String>>>,
        assistant_transcript: &Arc<RwLock<String>>,
    ) {
        match event {
            ServerEvent::SessionCreated { session } => {
                tracing::info!("Realtime session created: {}", session.id);
                *session_id.write().await = Some(session.id);
            }

            ServerEvent::SessionUpdated { session } => {
                tracing::debug!("Realtime session updated: {}", session.id);
            }

            ServerEvent::Error { error } => {
                tracing::error!("Realtime API error: {} - {}", error.error_type, error.message);
                if let Some(cb) = error_cb.lock().await.as_ref() {
                    let err = RealtimeError::ProviderError(format!(
                        "{}: {}",
                        error.error_type, error.message
                    ));
                    cb(err).await;
                }
            }

            ServerEvent::SpeechStarted {
                audio_start_ms,
                item_id,
            } => {
                tracing::debug!("Speech started at {}ms", audio_start_ms);
                if let Some(cb) = speech_event_cb.lock().await.as_ref() {
                    cb(SpeechEvent::Started {
                        audio_start_ms,
                        item_id: Some(item_id),
                    })
                    .await;
                }
            }

            ServerEvent::SpeechStopped {
                audio_end_ms,
                item_id,
            } => {
                tracing::debug!("Speech stopped at {}ms", audio_end_ms);
                if let Some(cb) = speech_event_cb.lock().await.as_ref() {
                    cb(SpeechEvent::Stopped {
                        audio_end_ms,
                        item_id: Some(item_id),
                    })
                    .await;
                }
            }

            ServerEvent::TranscriptionCompleted {
                item_id,
                transcript,
            } => {
                tracing::debug!("User transcript: {}", transcript);
                if let Some(cb) = transcript_cb.lock().await.as_ref() {
                    cb(TranscriptResult {
                        text: transcript,
                        role: TranscriptRole::User,
                        is_final: true,
                        item_id: Some(item_id),
                    })
                    .await;
                }
            }

            ServerEvent::AudioTranscriptDelta { delta, .. } => {
                assistant_transcript.write().await.push_str(&delta);

                // Send partial transcript
                if let Some(cb) = transcript_cb.lock().await.as_ref() {
                    let current = assistant_transcript.read().await.clone();
                    cb(TranscriptResult {
                        text: current,
                        role: TranscriptRole::Assistant,
                        is_final: false,
                        item_id: None,
                    })
                    .await;
                }
            }

            ServerEvent::AudioTranscriptDone {
                transcript,
                item_id,
                ..
            } => {
                tracing::debug!("Assistant transcript: {}", transcript);
                *assistant_transcript.write().await = String::new();

                if let Some(cb) = transcript_cb.lock().await.as_ref() {
                    cb(TranscriptResult {
                        text: transcript,
                        role: TranscriptRole::Assistant,
                        is_final: true,
                        item_id: Some(item_id),
                    })
                    .await;
                }
            }

            ServerEvent::AudioDelta {
                delta,
                item_id,
                response_id,
            } => {
                // Decode base64 audio and forward to callback
                if let Some(cb) = audio_cb.lock().await.as_ref() {
                    match ServerEvent::decode_audio_delta(&delta) {
                        Ok(audio_bytes) => {
                            cb(RealtimeAudioData {
                                data: Bytes::from(audio_bytes),
                                sample_rate: AZURE_REALTIME_SAMPLE_RATE,
                                item_id: Some(item_id),
                                response_id: Some(response_id),
                            })
                            .await;
                        }
                        Err(e) => {
                            tracing::error!("Failed to decode audio delta: {}", e);
                        }
                    }
                }
            }

            ServerEvent::AudioDone { response_id, .. } => {
                tracing::trace!("Audio done for response {}", response_id);
            }

            ServerEvent::ResponseDone { response } => {
                tracing::debug!("Response done: {}", response.id);
                if let Some(cb) = response_done_cb.lock().await.as_ref() {
                    cb(response.id).await;
                }
            }

            ServerEvent::Other => {
                tracing::trace!("Unhandled server event");
            }
        }
    }

    /// Send an event to the WebSocket.
    async fn send_event(&self, event: ClientEvent) -> RealtimeResult<()> {
        if let Some(sender) = self.ws_sender.lock().await.as_ref() {
            sender
                .send(event)
                .await
                .map_err(|e| RealtimeError::WebSocketError(e.to_string()))?;
            Ok(())
        } else {
            Err(RealtimeError::NotConnected)
        }
    }
}

#[async_trait]
impl BaseRealtime for AzureRealtime {
    fn new(config: RealtimeConfig) -> RealtimeResult<Self> {
        if config.api_key.is_empty() {
            return Err(RealtimeError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }
        if config.gateway_url.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Gateway URL is required".to_string(),
            ));
        }
        if config.deployment.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Deployment name is required".to_string(),
            ));
        }
        if config.api_version.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "API version is required".to_string(),
            ));
        }

        let voice = if let Some(ref v) = config.voice {
            AzureRealtimeVoice::from_str_or_default(v)
        } else {
            AzureRealtimeVoice::default()
        };

        Ok(Self {
            config,
            voice,
            state: Arc::new(std::sync::RwLock::new(ConnectionState::Disconnected)),
            connected: Arc::new(AtomicBool::new(false)),
            session_id: Arc::new(RwLock::new(None)),
            intentional_disconnect: Arc::new(AtomicBool::new(false)),
            ws_sender: Arc::new(Mutex::new(None)),
            transcript_callback: Arc::new(Mutex::new(None)),
            audio_callback: Arc::new(Mutex::new(None)),
            error_callback: Arc::new(Mutex::new(None)),
            speech_event_callback: Arc::new(Mutex::new(None)),
            response_done_callback: Arc::new(Mutex::new(None)),
            connection_handle: Arc::new(Mutex::new(None)),
            assistant_transcript: Arc::new(RwLock::new(String::new())),
        })
    }

    async fn connect(&mut self) -> RealtimeResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.intentional_disconnect.store(false, Ordering::SeqCst);
        store_state(&self.state, ConnectionState::Connecting);

        let url = build_realtime_url(
            &self.config.gateway_url,
            &self.config.deployment,
            &self.config.api_version,
        )?;

        let host = url
            .host_str()
            .ok_or_else(|| {
                RealtimeError::InvalidConfiguration("Gateway URL has no host".to_string())
            })?
            .to_string();
        let host_header = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };

        let request = http::Request::builder()
            .uri(url.as_str())
            .header("api-key", &self.config.api_key)
            .header(
                "Sec-WebSocket-Key",
                tungstenite::handshake::client::generate_key(),
            )
            .header("Sec-WebSocket-Version", "13")
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Host", host_header)
            .body(())
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        let (ws_stream, _response) = match tokio_tungstenite::connect_async(request).await {
            Ok(connected) => connected,
            Err(e) => {
                store_state(&self.state, ConnectionState::Failed);
                return Err(RealtimeError::ConnectionFailed(e.to_string()));
            }
        };

        tracing::info!(
            deployment = %self.config.deployment,
            "Connected to Azure OpenAI Realtime API"
        );

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        let (tx, mut rx) = mpsc::channel::<ClientEvent>(WS_CHANNEL_CAPACITY);
        *self.ws_sender.lock().await = Some(tx);

        // Clone references for the connection task
        let transcript_cb = self.transcript_callback.clone();
        let audio_cb = self.audio_callback.clone();
        let error_cb = self.error_callback.clone();
        let speech_event_cb = self.speech_event_callback.clone();
        let response_done_cb = self.response_done_callback.clone();
        let session_id = self.session_id.clone();
        let state = self.state.clone();
        let ws_sender = self.ws_sender.clone();
        let connected = self.connected.clone();
        let intentional_disconnect = self.intentional_disconnect.clone();
        let assistant_transcript = self.assistant_transcript.clone();

        self.connected.store(true, Ordering::SeqCst);
        store_state(&self.state, ConnectionState::Connected);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Outgoing client events
                    Some(event) = rx.recv() => {
                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("Failed to serialize client event: {}", e);
                                continue;
                            }
                        };

                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            tracing::error!("Failed to send WebSocket message: {}", e);
                            break;
                        }
                    }

                    // Incoming server events
                    Some(msg) = ws_stream.next() => {
                        match msg {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<ServerEvent>(&text) {
                                    Ok(event) => {
                                        Self::handle_server_event(
                                            event,
                                            &transcript_cb,
                                            &audio_cb,
                                            &error_cb,
                                            &speech_event_cb,
                                            &response_done_cb,
                                            &session_id,
                                            &assistant_transcript,
                                        ).await;
                                    }
                                    Err(e) => {
                                        tracing::warn!("Failed to parse server event: {}", e);
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => {
                                tracing::info!("WebSocket closed by server");
                                break;
                            }
                            Ok(Message::Ping(data)) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("Failed to send pong: {}", e);
                                }
                            }
                            Err(e) => {
                                tracing::error!("WebSocket error: {}", e);
                                break;
                            }
                            _ => {}
                        }
                    }

                    else => break,
                }
            }

            // Connection ended. No reconnection: a lost upstream ends the session.
            connected.store(false, Ordering::SeqCst);
            *ws_sender.lock().await = None;

            if intentional_disconnect.load(Ordering::SeqCst) {
                store_state(&state, ConnectionState::Disconnected);
            } else {
                store_state(&state, ConnectionState::Failed);
                if let Some(cb) = error_cb.lock().await.as_ref() {
                    cb(RealtimeError::ConnectionFailed(
                        "Upstream connection lost".to_string(),
                    ))
                    .await;
                }
            }

            tracing::info!("Realtime connection task ended");
        });

        *self.connection_handle.lock().await = Some(handle);

        // Configure the session for server-side voice activity detection
        let session_config = self.build_session_config();
        self.send_event(ClientEvent::SessionUpdate {
            session: session_config,
        })
        .await?;

        Ok(())
    }

    async fn disconnect(&mut self) -> RealtimeResult<()> {
        self.intentional_disconnect.store(true, Ordering::SeqCst);

        // Clear sender to stop the connection loop
        *self.ws_sender.lock().await = None;

        if let Some(handle) = self.connection_handle.lock().await.take() {
            handle.abort();
        }

        self.connected.store(false, Ordering::SeqCst);
        store_state(&self.state, ConnectionState::Disconnected);
        *self.session_id.write().await = None;

        tracing::info!("Disconnected from Azure OpenAI Realtime API");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn get_connection_state(&self) -> ConnectionState {
        match self.state.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    async fn send_audio(&mut self, audio_data: Bytes) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        let event = ClientEvent::audio_append(&audio_data);
        self.send_event(event).await
    }

    async fn send_text(&mut self, text: &str) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        let event = ClientEvent::ConversationItemCreate {
            item: ConversationItem::user_text(text),
        };
        self.send_event(event).await
    }

    async fn create_response(&mut self) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        self.send_event(ClientEvent::ResponseCreate).await
    }

    async fn cancel_response(&mut self) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        self.send_event(ClientEvent::ResponseCancel).await
    }

    async fn commit_audio_buffer(&mut self) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        self.send_event(ClientEvent::InputAudioBufferCommit).await
    }

    async fn clear_audio_buffer(&mut self) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        self.send_event(ClientEvent::InputAudioBufferClear).await
    }

    async fn update_session(&mut self, config: RealtimeConfig) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        // Preserve existing credentials if the new config omits them
        let api_key = if config.api_key.is_empty() {
            std::mem::take(&mut self.config.api_key)
        } else {
            config.api_key.clone()
        };
        self.config = RealtimeConfig { api_key, ..config };

        if let Some(ref v) = self.config.voice {
            self.voice = AzureRealtimeVoice::from_str_or_default(v);
        }

        let session_config = self.build_session_config();
        self.send_event(ClientEvent::SessionUpdate {
            session: session_config,
        })
        .await
    }

    fn on_transcript(&mut self, callback: TranscriptCallback) -> RealtimeResult<()> {
        // Register synchronously when possible so no events race past an
        // unregistered callback; fall back to a spawn if the lock is held.
        if let Ok(mut guard) = self.transcript_callback.try_lock() {
            *guard = Some(callback);
        } else {
            let cb = self.transcript_callback.clone();
            tokio::spawn(async move {
                *cb.lock().await = Some(callback);
            });
        }
        Ok(())
    }

    fn on_audio(&mut self, callback: AudioOutputCallback) -> RealtimeResult<()> {
        if let Ok(mut guard) = self.audio_callback.try_lock() {
            *guard = Some(callback);
        } else {
            let cb = self.audio_callback.clone();
            tokio::spawn(async move {
                *cb.lock().await = Some(callback);
            });
        }
        Ok(())
    }

    fn on_error(&mut self, callback: RealtimeErrorCallback) -> RealtimeResult<()> {
        if let Ok(mut guard) = self.error_callback.try_lock() {
            *guard = Some(callback);
        } else {
            let cb = self.error_callback.clone();
            tokio::spawn(async move {
                *cb.lock().await = Some(callback);
            });
        }
        Ok(())
    }

    fn on_speech_event(&mut self, callback: SpeechEventCallback) -> RealtimeResult<()> {
        if let Ok(mut guard) = self.speech_event_callback.try_lock() {
            *guard = Some(callback);
        } else {
            let cb = self.speech_event_callback.clone();
            tokio::spawn(async move {
                *cb.lock().await = Some(callback);
            });
        }
        Ok(())
    }

    fn on_response_done(&mut self, callback: ResponseDoneCallback) -> RealtimeResult<()> {
        if let Ok(mut guard) = self.response_done_callback.try_lock() {
            *guard = Some(callback);
        } else {
            let cb = self.response_done_callback.clone();
            tokio::spawn(async move {
                *cb.lock().await = Some(callback);
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RealtimeConfig {
        RealtimeConfig {
            gateway_url: "https://gateway.example.com".to_string(),
            deployment: "gpt-4o-realtime-preview".to_string(),
            api_key: "test_key".to_string(),
            api_version: "2024-10-01-preview".to_string(),
            voice: Some("shimmer".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_azure_realtime_creation() {
        let realtime = AzureRealtime::new(test_config()).unwrap();
        assert!(!realtime.is_ready());
        assert_eq!(
            realtime.get_connection_state(),
            ConnectionState::Disconnected
        );
        assert_eq!(realtime.voice(), AzureRealtimeVoice::Shimmer);
        assert!(realtime.session_id().await.is_none());
    }

    #[tokio::test]
    async fn test_api_key_required() {
        let config = RealtimeConfig {
            api_key: String::new(),
            ..test_config()
        };

        let result = AzureRealtime::new(config);
        assert!(result.is_err());
        match result {
            Err(RealtimeError::AuthenticationFailed(_)) => {}
            _ => panic!("Expected AuthenticationFailed error"),
        }
    }

    #[tokio::test]
    async fn test_gateway_url_required() {
        let config = RealtimeConfig {
            gateway_url: String::new(),
            ..test_config()
        };

        match AzureRealtime::new(config) {
            Err(RealtimeError::InvalidConfiguration(msg)) => {
                assert!(msg.contains("Gateway URL"));
            }
            _ => panic!("Expected InvalidConfiguration error"),
        }
    }

    #[tokio::test]
    async fn test_deployment_required() {
        let config = RealtimeConfig {
            deployment: String::new(),
            ..test_config()
        };

        assert!(matches!(
            AzureRealtime::new(config),
            Err(RealtimeError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_send_audio_requires_connection() {
        let mut realtime = AzureRealtime::new(test_config()).unwrap();
        let result = realtime.send_audio(Bytes::from(vec![0u8; 960])).await;
        assert!(matches!(result, Err(RealtimeError::NotConnected)));
    }

    #[tokio::test]
    async fn test_create_response_requires_connection() {
        let mut realtime = AzureRealtime::new(test_config()).unwrap();
        assert!(matches!(
            realtime.create_response().await,
            Err(RealtimeError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_failed_connect_is_observable() {
        let config = RealtimeConfig {
            gateway_url: "http://127.0.0.1:1".to_string(),
            ..test_config()
        };
        let mut realtime = AzureRealtime::new(config).unwrap();

        assert!(matches!(
            realtime.connect().await,
            Err(RealtimeError::ConnectionFailed(_))
        ));
        assert_eq!(realtime.get_connection_state(), ConnectionState::Failed);
        assert!(!realtime.is_ready());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut realtime = AzureRealtime::new(test_config()).unwrap();
        assert!(realtime.disconnect().await.is_ok());
        assert!(realtime.disconnect().await.is_ok());
        assert!(!realtime.is_ready());
    }

    #[test]
    fn test_session_config_defaults_to_both_modalities() {
        let realtime = AzureRealtime::new(test_config()).unwrap();
        let session = realtime.build_session_config();
        assert_eq!(
            session.modalities,
            Some(vec!["text".to_string(), "audio".to_string()])
        );
        assert_eq!(session.voice.as_deref(), Some("shimmer"));
        assert_eq!(session.input_audio_format.as_deref(), Some("pcm16"));
    }

    #[test]
    fn test_session_config_carries_vad_settings() {
        let config = RealtimeConfig {
            turn_detection: Some(crate::core::realtime::base::TurnDetectionConfig::ServerVad {
                threshold: Some(0.4),
                prefix_padding_ms: None,
                silence_duration_ms: Some(600),
            }),
            ..test_config()
        };
        let realtime = AzureRealtime::new(config).unwrap();
        let session = realtime.build_session_config();
        match session.turn_detection {
            Some(TurnDetection::ServerVad {
                threshold,
                silence_duration_ms,
                ..
            }) => {
                assert_eq!(threshold, Some(0.4));
                assert_eq!(silence_duration_ms, Some(600));
            }
            _ => panic!("Expected ServerVad turn detection"),
        }
    }
}
