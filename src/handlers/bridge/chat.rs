//! Conversation history accumulated from final transcripts.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::realtime::base::{TranscriptResult, TranscriptRole};

/// A single entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role ("user" or "assistant")
    pub role: String,
    /// Transcript text
    pub content: String,
}

/// Conversation history for a bridge session.
///
/// Only final transcripts are recorded; streaming partials are forwarded to
/// the client but never stored here.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: RwLock<Vec<ChatMessage>>,
}

impl ChatLog {
    /// Create an empty chat log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transcript, ignoring non-final results.
    ///
    /// Returns `true` when an entry was appended.
    pub async fn apply(&self, transcript: &TranscriptResult) -> bool {
        if !transcript.is_final {
            return false;
        }

        let role = match transcript.role {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
        };

        self.messages.write().await.push(ChatMessage {
            role: role.to_string(),
            content: transcript.text.clone(),
        });
        true
    }

    /// Snapshot of the conversation so far.
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    /// Number of recorded entries.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Whether the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(text: &str, role: TranscriptRole, is_final: bool) -> TranscriptResult {
        TranscriptResult {
            text: text.to_string(),
            role,
            is_final,
            item_id: None,
        }
    }

    #[tokio::test]
    async fn test_final_transcript_appends_one_entry() {
        let log = ChatLog::new();
        assert!(log.apply(&transcript("hello", TranscriptRole::User, true)).await);

        let messages = log.snapshot().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_partial_transcript_ignored() {
        let log = ChatLog::new();
        assert!(!log.apply(&transcript("hel", TranscriptRole::Assistant, false)).await);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_roles_recorded_in_order() {
        let log = ChatLog::new();
        log.apply(&transcript("hi", TranscriptRole::User, true)).await;
        log.apply(&transcript("hello there", TranscriptRole::Assistant, true))
            .await;

        let messages = log.snapshot().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }
}
