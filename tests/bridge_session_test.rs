//! Integration tests for the bridge session.
//!
//! The provider event ingestion methods are driven directly, so these cover
//! the session's queueing, interruption, and chat semantics without any
//! upstream connection.

use bytes::Bytes;
use voice_bridge::core::realtime::{RealtimeAudioData, SpeechEvent, TranscriptResult};
use voice_bridge::core::realtime::base::TranscriptRole;
use voice_bridge::handlers::bridge::session::{BridgeOutput, BridgeSession, BridgeSettings};

fn test_session() -> BridgeSession {
    BridgeSession::new(BridgeSettings {
        gateway_url: "https://gateway.example.com".to_string(),
        deployment: "gpt-4o-realtime-preview".to_string(),
        api_key: "test_key".to_string(),
        api_version: "2024-10-01-preview".to_string(),
        ..Default::default()
    })
}

fn audio_chunk(len: usize) -> RealtimeAudioData {
    RealtimeAudioData {
        data: Bytes::from(vec![0u8; len]),
        sample_rate: 24000,
        item_id: None,
        response_id: None,
    }
}

fn final_transcript(text: &str, role: TranscriptRole) -> TranscriptResult {
    TranscriptResult {
        text: text.to_string(),
        role,
        is_final: true,
        item_id: None,
    }
}

#[tokio::test]
async fn test_receive_before_startup_is_noop() {
    let session = test_session();

    // Frames arriving before the upstream connection exists are dropped,
    // not treated as errors.
    let result = session.receive(Bytes::from(vec![0u8; 960])).await;
    assert!(result.is_ok());
    assert!(!session.is_connected().await);
    assert_eq!(session.pending_outputs().await, 0);
}

#[tokio::test]
async fn test_speech_start_clears_pending_output() {
    let session = test_session();

    session.ingest_audio(audio_chunk(960)).await;
    session.ingest_audio(audio_chunk(960)).await;
    session
        .ingest_transcript(final_transcript("stale", TranscriptRole::Assistant))
        .await;
    assert_eq!(session.pending_outputs().await, 3);

    session
        .ingest_speech(SpeechEvent::Started {
            audio_start_ms: 1500,
            item_id: None,
        })
        .await;

    // Only the speech event itself survives the interruption.
    assert_eq!(session.pending_outputs().await, 1);
    match session.try_emit().await {
        Some(BridgeOutput::Speech(SpeechEvent::Started { audio_start_ms, .. })) => {
            assert_eq!(audio_start_ms, 1500);
        }
        other => panic!("Expected speech start, got {other:?}"),
    }
}

#[tokio::test]
async fn test_speech_stop_does_not_clear() {
    let session = test_session();

    session.ingest_audio(audio_chunk(960)).await;
    session
        .ingest_speech(SpeechEvent::Stopped {
            audio_end_ms: 2100,
            item_id: None,
        })
        .await;

    assert_eq!(session.pending_outputs().await, 2);
}

#[tokio::test]
async fn test_final_user_transcript_appends_one_chat_entry() {
    let session = test_session();

    session
        .ingest_transcript(final_transcript("what's your name?", TranscriptRole::User))
        .await;

    let chat = session.chat_snapshot().await;
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0].role, "user");
    assert_eq!(chat[0].content, "what's your name?");
}

#[tokio::test]
async fn test_partial_transcripts_not_recorded() {
    let session = test_session();

    for text in ["My", "My name", "My name is Amy"] {
        session
            .ingest_transcript(TranscriptResult {
                text: text.to_string(),
                role: TranscriptRole::Assistant,
                is_final: false,
                item_id: None,
            })
            .await;
    }
    session
        .ingest_transcript(final_transcript("My name is Amy.", TranscriptRole::Assistant))
        .await;

    // Partials are queued for the client but only the final lands in chat.
    let chat = session.chat_snapshot().await;
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0].role, "assistant");
    assert_eq!(chat[0].content, "My name is Amy.");
    assert_eq!(session.pending_outputs().await, 4);
}

#[tokio::test]
async fn test_outputs_emitted_in_fifo_order() {
    let session = test_session();

    session.ingest_audio(audio_chunk(2)).await;
    session
        .ingest_transcript(final_transcript("hello", TranscriptRole::Assistant))
        .await;
    session.ingest_response_done("resp_1".to_string()).await;

    assert!(matches!(
        session.try_emit().await,
        Some(BridgeOutput::Audio(_))
    ));
    assert!(matches!(
        session.try_emit().await,
        Some(BridgeOutput::Transcript(_))
    ));
    match session.try_emit().await {
        Some(BridgeOutput::ResponseDone(id)) => assert_eq!(id, "resp_1"),
        other => panic!("Expected response done, got {other:?}"),
    }
    assert!(session.try_emit().await.is_none());
}

#[tokio::test]
async fn test_emit_waits_for_output() {
    use std::sync::Arc;
    use std::time::Duration;

    let session = Arc::new(test_session());

    let waiter = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.emit().await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    session.ingest_response_done("resp_2".to_string()).await;

    let output = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("emit should complete")
        .expect("task should not panic");
    assert!(matches!(output, BridgeOutput::ResponseDone(id) if id == "resp_2"));
}

#[tokio::test]
async fn test_upstream_error_is_emitted() {
    let session = test_session();

    session.ingest_audio(audio_chunk(960)).await;
    session
        .ingest_error("Connection failed: upstream connection lost".to_string())
        .await;

    // Errors take their place in the FIFO behind earlier output.
    assert!(matches!(
        session.try_emit().await,
        Some(BridgeOutput::Audio(_))
    ));
    match session.try_emit().await {
        Some(BridgeOutput::Error(message)) => {
            assert!(message.contains("upstream connection lost"));
        }
        other => panic!("Expected error output, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let session = test_session();
    session.ingest_audio(audio_chunk(960)).await;

    assert!(session.shutdown().await.is_ok());
    assert!(session.shutdown().await.is_ok());

    // Shutdown drops anything still queued.
    assert_eq!(session.pending_outputs().await, 0);
    assert!(!session.is_connected().await);
}

#[tokio::test]
async fn test_control_before_startup_fails() {
    let session = test_session();
    assert!(session.send_text("hello").await.is_err());
    assert!(session.create_response().await.is_err());
    assert!(session.clear_audio().await.is_err());
}
