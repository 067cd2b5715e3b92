//! Session Store Adapter.
//!
//! Thin persistence boundary between the chat components and
//! [`ChatRepository`]. Every write and every history read takes the caller's
//! [`Identity`]; for guests they are no-ops, because nothing a guest does is
//! ever persisted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use helpdesk_types::chat::{ChatMessage, ChatSession};
use helpdesk_types::error::RepositoryError;
use helpdesk_types::identity::Identity;
use helpdesk_types::organization::Organization;
use uuid::Uuid;

use super::repository::{ChatRepository, OrganizationRepository};

/// Outcome of a write through the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// Guest caller; nothing was written.
    Skipped,
}

pub struct SessionStore<C: ChatRepository, O: OrganizationRepository> {
    chats: Arc<C>,
    organizations: Arc<O>,
}

impl<C: ChatRepository, O: OrganizationRepository> Clone for SessionStore<C, O> {
    fn clone(&self) -> Self {
        Self {
            chats: Arc::clone(&self.chats),
            organizations: Arc::clone(&self.organizations),
        }
    }
}

impl<C: ChatRepository, O: OrganizationRepository> SessionStore<C, O> {
    pub fn new(chats: Arc<C>, organizations: Arc<O>) -> Self {
        Self {
            chats,
            organizations,
        }
    }

    /// Look up an organization. Reads are allowed for every caller.
    pub async fn organization(&self, id: i64) -> Result<Option<Organization>, RepositoryError> {
        self.organizations.get(id).await
    }

    /// Whether a persisted session already uses `id`.
    pub async fn id_taken(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        self.chats.session_exists(id).await
    }

    /// Persist a session and its welcome message.
    pub async fn create(
        &self,
        identity: &Identity,
        session: &ChatSession,
        welcome: &ChatMessage,
    ) -> Result<WriteOutcome, RepositoryError> {
        match identity {
            Identity::Authenticated { .. } => {
                self.chats.create_session(session, welcome).await?;
                Ok(WriteOutcome::Persisted)
            }
            Identity::Guest { .. } => Ok(WriteOutcome::Skipped),
        }
    }

    /// The caller's own session, or `None`. Guests own no persisted sessions.
    pub async fn owned_session(
        &self,
        identity: &Identity,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        match identity {
            Identity::Authenticated { user_id } => {
                self.chats.get_owned_session(session_id, user_id).await
            }
            Identity::Guest { .. } => Ok(None),
        }
    }

    pub async fn sessions(
        &self,
        identity: &Identity,
    ) -> Result<Vec<(ChatSession, Organization)>, RepositoryError> {
        match identity {
            Identity::Authenticated { user_id } => self.chats.list_sessions(user_id).await,
            Identity::Guest { .. } => Ok(Vec::new()),
        }
    }

    /// Delete an owned session. Guests always get `Ok(true)`: there is
    /// nothing of theirs to delete.
    pub async fn remove(
        &self,
        identity: &Identity,
        session_id: &Uuid,
    ) -> Result<bool, RepositoryError> {
        match identity {
            Identity::Authenticated { user_id } => {
                self.chats.delete_session(session_id, user_id).await
            }
            Identity::Guest { .. } => Ok(true),
        }
    }

    /// Append a message. On persist, `message.created_at` is updated to the
    /// timestamp the repository actually stored.
    pub async fn append(
        &self,
        identity: &Identity,
        message: &mut ChatMessage,
    ) -> Result<WriteOutcome, RepositoryError> {
        match identity {
            Identity::Authenticated { .. } => {
                message.created_at = self.chats.save_message(message).await?;
                Ok(WriteOutcome::Persisted)
            }
            Identity::Guest { .. } => Ok(WriteOutcome::Skipped),
        }
    }

    /// Newest-first slice of history strictly older than `before`.
    pub async fn page(
        &self,
        identity: &Identity,
        session_id: &Uuid,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        match identity {
            Identity::Authenticated { .. } => {
                self.chats.messages_before(session_id, before, limit).await
            }
            Identity::Guest { .. } => Ok(Vec::new()),
        }
    }
}
