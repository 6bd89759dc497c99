//! Bridge WebSocket handler.
//!
//! Upgrades the client connection and runs one bridge session over it.
//! Binary frames carry microphone audio upstream; the emitter task drains
//! the session's output queue back to the client as binary audio frames and
//! JSON control messages.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::realtime::base::SpeechEvent;
use crate::state::AppState;

use super::messages::{BridgeIncomingMessage, BridgeMessageRoute, BridgeOutgoingMessage};
use super::session::{BridgeOutput, BridgeSession};

/// Channel buffer size for outgoing messages
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Stream WebSocket handler.
///
/// Upgrades the HTTP connection and bridges the client's audio stream to the
/// configured realtime deployment.
pub async fn stream_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("Stream WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_stream_socket(socket, state))
}

/// Run one bridge session over an upgraded socket.
async fn handle_stream_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Stream WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<BridgeMessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing messages
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let should_close = matches!(route, BridgeMessageRoute::Close);

            let result = match route {
                BridgeMessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                BridgeMessageRoute::Audio(data) => sender.send(Message::Binary(data)).await,
                BridgeMessageRoute::Close => {
                    info!("Closing stream WebSocket connection");
                    sender.send(Message::Close(None)).await
                }
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    // Connect the session upstream before accepting any client traffic
    let session = Arc::new(BridgeSession::new(state.config.bridge_settings()));
    if let Err(e) = Arc::clone(&session).start_up().await {
        error!(session_id = %session_id, "Failed to start bridge session: {}", e);
        let _ = message_tx
            .send(BridgeMessageRoute::Outgoing(BridgeOutgoingMessage::Error {
                code: "startup_failed".to_string(),
                message: e.to_string(),
            }))
            .await;
        let _ = message_tx
            .send(BridgeMessageRoute::Outgoing(
                BridgeOutgoingMessage::Closing {
                    reason: "session startup failed".to_string(),
                },
            ))
            .await;
        let _ = message_tx.send(BridgeMessageRoute::Close).await;
        let _ = sender_task.await;
        return;
    }

    let _ = message_tx
        .send(BridgeMessageRoute::Outgoing(
            BridgeOutgoingMessage::SessionReady {
                session_id: session_id.clone(),
                deployment: session.settings().deployment.clone(),
                voice: session.settings().voice.clone(),
            },
        ))
        .await;

    if session.settings().welcome_on_connect
        && let Err(e) = session.welcome().await
    {
        warn!("Welcome prompt failed: {}", e);
    }

    // Emitter task draining the session's output queue toward the client
    let emitter_task = {
        let session = Arc::clone(&session);
        let message_tx = message_tx.clone();
        tokio::spawn(async move {
            loop {
                let output = session.emit().await;
                let send_result = match output {
                    BridgeOutput::Audio(audio) => {
                        message_tx.send(BridgeMessageRoute::Audio(audio.data)).await
                    }
                    BridgeOutput::Transcript(transcript) => {
                        message_tx
                            .send(BridgeMessageRoute::Outgoing(
                                BridgeOutgoingMessage::Transcript {
                                    text: transcript.text,
                                    role: transcript.role.to_string(),
                                    is_final: transcript.is_final,
                                },
                            ))
                            .await
                    }
                    BridgeOutput::Speech(event) => {
                        let (name, audio_ms) = match event {
                            SpeechEvent::Started { audio_start_ms, .. } => {
                                ("started", audio_start_ms)
                            }
                            SpeechEvent::Stopped { audio_end_ms, .. } => ("stopped", audio_end_ms),
                        };
                        message_tx
                            .send(BridgeMessageRoute::Outgoing(
                                BridgeOutgoingMessage::SpeechEvent {
                                    event: name.to_string(),
                                    audio_ms,
                                },
                            ))
                            .await
                    }
                    BridgeOutput::ResponseDone(response_id) => {
                        message_tx
                            .send(BridgeMessageRoute::Outgoing(
                                BridgeOutgoingMessage::ResponseDone { response_id },
                            ))
                            .await
                    }
                    BridgeOutput::Error(message) => {
                        warn!("Upstream error: {}", message);
                        let _ = message_tx
                            .send(BridgeMessageRoute::Outgoing(BridgeOutgoingMessage::Error {
                                code: "upstream_error".to_string(),
                                message,
                            }))
                            .await;
                        // Upstream failures end the session; there is no reconnection.
                        let _ = message_tx
                            .send(BridgeMessageRoute::Outgoing(
                                BridgeOutgoingMessage::Closing {
                                    reason: "upstream connection lost".to_string(),
                                },
                            ))
                            .await;
                        let _ = message_tx.send(BridgeMessageRoute::Close).await;
                        break;
                    }
                };

                if send_result.is_err() {
                    break;
                }
            }
        })
    };

    // Main receive loop for client traffic
    loop {
        match receiver.next().await {
            Some(Ok(msg)) => {
                let continue_processing = process_stream_message(msg, &session, &message_tx).await;
                if !continue_processing {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!("Stream WebSocket error: {}", e);
                break;
            }
            None => {
                info!(session_id = %session_id, "Stream closed by client");
                break;
            }
        }
    }

    // Cleanup
    emitter_task.abort();

    let _ = message_tx
        .send(BridgeMessageRoute::Outgoing(
            BridgeOutgoingMessage::Closing {
                reason: "session ended".to_string(),
            },
        ))
        .await;
    let _ = message_tx.send(BridgeMessageRoute::Close).await;

    if let Err(e) = session.shutdown().await {
        error!("Error during session shutdown: {}", e);
    }

    let _ = sender_task.await;

    info!(session_id = %session_id, "Stream WebSocket connection terminated");
}

/// Process one client frame. Returns false when the connection should close.
async fn process_stream_message(
    msg: Message,
    session: &Arc<BridgeSession>,
    message_tx: &mpsc::Sender<BridgeMessageRoute>,
) -> bool {
    match msg {
        Message::Binary(data) => {
            if let Err(e) = session.receive(data).await {
                warn!("Failed to relay audio frame: {}", e);
                let _ = message_tx
                    .send(BridgeMessageRoute::Outgoing(BridgeOutgoingMessage::Error {
                        code: "audio_relay_failed".to_string(),
                        message: e.to_string(),
                    }))
                    .await;
            }
            true
        }

        Message::Text(text) => {
            let incoming = match serde_json::from_str::<BridgeIncomingMessage>(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    debug!("Invalid control message: {}", e);
                    let _ = message_tx
                        .send(BridgeMessageRoute::Outgoing(BridgeOutgoingMessage::Error {
                            code: "invalid_message".to_string(),
                            message: format!("Failed to parse message: {e}"),
                        }))
                        .await;
                    return true;
                }
            };

            if let Err(e) = incoming.validate() {
                let _ = message_tx
                    .send(BridgeMessageRoute::Outgoing(BridgeOutgoingMessage::Error {
                        code: "invalid_message".to_string(),
                        message: e,
                    }))
                    .await;
                return true;
            }

            let result = match incoming {
                BridgeIncomingMessage::Text { text } => session.send_text(&text).await,
                BridgeIncomingMessage::CreateResponse => session.create_response().await,
                BridgeIncomingMessage::ClearAudio => session.clear_audio().await,
            };

            if let Err(e) = result {
                warn!("Control message failed: {}", e);
                let _ = message_tx
                    .send(BridgeMessageRoute::Outgoing(BridgeOutgoingMessage::Error {
                        code: "control_failed".to_string(),
                        message: e.to_string(),
                    }))
                    .await;
            }
            true
        }

        Message::Close(_) => {
            info!("Received close frame from client");
            false
        }

        // Pings are answered by axum automatically
        _ => true,
    }
}
