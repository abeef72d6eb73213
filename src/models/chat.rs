//! Chat session, transcript, and context types.

use super::{Fragment, Point};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a chat session.
///
/// Completion results are matched against this id so that a reply arriving
/// after its session was closed is discarded instead of leaking into a new
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new unique session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human user.
    User,
    /// The language model.
    Assistant,
}

impl Role {
    /// Returns the role as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message id.
    pub id: String,
    /// Author.
    pub role: Role,
    /// Literal text.
    pub content: String,
    /// When the message was appended.
    pub timestamp: DateTime<Utc>,
    /// Context fragments attached when the message was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_fragments: Option<Vec<Fragment>>,
}

impl Message {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            attached_fragments: None,
        }
    }

    /// Records the fragments that were in context for this message.
    #[must_use]
    pub fn with_fragments(mut self, fragments: Vec<Fragment>) -> Self {
        if !fragments.is_empty() {
            self.attached_fragments = Some(fragments);
        }
        self
    }
}

/// A fragment attached to a session's working context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    /// Resolved identity the entry is keyed by.
    pub identity: String,
    /// The attached fragment.
    pub fragment: Fragment,
    /// Attach time; strictly increasing within one store.
    pub added_at: DateTime<Utc>,
    /// Free-form position inside the dialogue surface.
    pub position: Point,
}

/// A dialogue session: a transcript plus its own context snapshot.
///
/// The context is held by the session's [`ContextStore`](crate::services::ContextStore),
/// so it is discarded together with the transcript when the session closes.
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Unique session id.
    pub id: SessionId,
    /// Display title.
    pub title: String,
    /// Append-only transcript.
    pub transcript: Vec<Message>,
    /// Working context.
    pub context: crate::services::ContextStore,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last transcript or context change.
    pub updated_at: DateTime<Utc>,
    /// Whether this is the orchestrator's active session.
    pub is_active: bool,
}

impl ChatSession {
    /// Creates an empty active session.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            title: title.into(),
            transcript: Vec::new(),
            context: crate::services::ContextStore::new(),
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    /// Derives a title from the first seed fragment.
    #[must_use]
    pub fn title_for(fragments: &[Fragment]) -> String {
        fragments.first().map_or_else(
            || "New conversation".to_string(),
            |f| format!("Conversation about {}", f.title),
        )
    }

    /// Appends a message and bumps `updated_at`.
    pub fn push(&mut self, message: Message) {
        self.updated_at = message.timestamp;
        self.transcript.push(message);
    }

    /// Marks the session as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_for() {
        assert_eq!(ChatSession::title_for(&[]), "New conversation");
        let fragments = vec![Fragment::new("Hooks", ""), Fragment::new("Grid", "")];
        assert_eq!(
            ChatSession::title_for(&fragments),
            "Conversation about Hooks"
        );
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, Role::User);
        assert_eq!(Message::assistant("ok").role, Role::Assistant);
    }

    #[test]
    fn test_with_fragments_skips_empty_snapshot() {
        let message = Message::user("hi").with_fragments(Vec::new());
        assert!(message.attached_fragments.is_none());
        let message = Message::user("hi").with_fragments(vec![Fragment::new("a", "")]);
        assert_eq!(message.attached_fragments.map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_push_updates_timestamp() {
        let mut session = ChatSession::new("t");
        let before = session.updated_at;
        session.push(Message::user("hello"));
        assert_eq!(session.transcript.len(), 1);
        assert!(session.updated_at >= before);
    }
}
