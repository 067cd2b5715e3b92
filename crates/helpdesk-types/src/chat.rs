//! Chat session and message types.
//!
//! Persisted rows (`ChatSession`, `ChatMessage`) exist only for
//! authenticated callers. The `*View` types are what callers see, for both
//! members and guests.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;
use crate::organization::Organization;

/// Number of messages served per history page.
pub const PAGE_SIZE: usize = 20;

/// Current time truncated to microseconds.
///
/// Timestamps are stored with microsecond precision, so every timestamp the
/// service hands out is truncated the same way. A cursor echoed back by a
/// client then compares exactly against stored rows.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A persisted chat session owned by one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub owner_id: UserId,
    pub organization_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single persisted message.
///
/// `is_ask` is true for caller-authored questions, false for the welcome
/// message and oracle replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub is_ask: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// A caller-authored question.
    pub fn ask(session_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(session_id, true, content.into())
    }

    /// A system-authored message (welcome or reply).
    pub fn reply(session_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(session_id, false, content.into())
    }

    fn new(session_id: Uuid, is_ask: bool, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            is_ask,
            content,
            created_at: now_micros(),
        }
    }
}

/// Session as returned to callers: `{id, title, organization}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub title: String,
    pub organization: Organization,
}

impl SessionView {
    pub fn new(session: &ChatSession, organization: Organization) -> Self {
        Self {
            id: session.id,
            title: session.title.clone(),
            organization,
        }
    }
}

/// Message as returned to callers.
///
/// `id` is absent for guest replies, which are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub chat_id: Uuid,
    pub is_ask: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ChatMessage> for MessageView {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: Some(message.id),
            chat_id: message.session_id,
            is_ask: message.is_ask,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<ChatMessage> for MessageView {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: Some(message.id),
            chat_id: message.session_id,
            is_ask: message.is_ask,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

/// One page of history, chronologically ordered (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub messages: Vec<MessageView>,
    /// True when the page came back full; older messages may exist.
    pub has_more: bool,
}

impl HistoryPage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Cursor for the next (older) page: the oldest timestamp held.
    pub fn next_cursor(&self) -> Option<DateTime<Utc>> {
        self.messages.first().map(|m| m.created_at)
    }
}
