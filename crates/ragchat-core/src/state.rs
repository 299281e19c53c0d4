//! UI-agnostic conversation state
//!
//! The transcript is owned by [`crate::ChatClient`] and only ever grows. It is
//! kept in memory for the lifetime of the process and never written to disk.

use serde::{Deserialize, Serialize};

/// A single turn in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Ai => "ai",
        }
    }
}

/// Append-only, ordered sequence of chat turns.
///
/// Entries cannot be edited or removed once appended; display order is
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_keeps_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::new(ChatRole::User, "hello"));
        transcript.push(ChatMessage::new(ChatRole::Ai, "hi there"));
        transcript.push(ChatMessage::new(ChatRole::User, "again"));

        let roles: Vec<ChatRole> = transcript.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Ai, ChatRole::User]);
        assert_eq!(transcript.last().map(|m| m.content.as_str()), Some("again"));
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn test_empty_transcript() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert!(transcript.last().is_none());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::new(ChatRole::Ai, "ok");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"ai","content":"ok"}"#);
    }
}
