//! Session Manager: create, list, and delete chat sessions.

use std::sync::Arc;

use helpdesk_types::chat::{ChatMessage, ChatSession, SessionView, now_micros};
use helpdesk_types::config::ChatSettings;
use helpdesk_types::error::{ChatError, RepositoryError};
use helpdesk_types::identity::Identity;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::repository::{ChatRepository, OrganizationRepository};
use super::store::SessionStore;

pub struct SessionManager<C: ChatRepository, O: OrganizationRepository> {
    store: SessionStore<C, O>,
    settings: Arc<ChatSettings>,
}

impl<C: ChatRepository, O: OrganizationRepository> SessionManager<C, O> {
    pub fn new(store: SessionStore<C, O>, settings: Arc<ChatSettings>) -> Self {
        Self { store, settings }
    }

    /// Start a new chat.
    ///
    /// Members get a persisted session seeded with the welcome message.
    /// Guests get a view with a fresh id and nothing is written.
    pub async fn create(
        &self,
        identity: &Identity,
        organization_id: i64,
        title: &str,
    ) -> Result<SessionView, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::Validation("title must not be empty".to_string()));
        }

        let organization = self
            .store
            .organization(organization_id)
            .await?
            .ok_or_else(|| {
                ChatError::Validation(format!("unknown organization {organization_id}"))
            })?;

        let user_id = match identity {
            Identity::Guest { guest_id } => {
                let id = Uuid::new_v4();
                debug!(%guest_id, session_id = %id, "Guest chat started (not persisted)");
                return Ok(SessionView {
                    id,
                    title: title.to_string(),
                    organization,
                });
            }
            Identity::Authenticated { user_id } => user_id,
        };

        let attempts = self.settings.id_retry_limit.max(1);
        for attempt in 1..=attempts {
            let id = Uuid::new_v4();
            if self.store.id_taken(&id).await? {
                warn!(session_id = %id, attempt, "Session id collision, regenerating");
                continue;
            }

            let now = now_micros();
            let session = ChatSession {
                id,
                owner_id: user_id.clone(),
                organization_id,
                title: title.to_string(),
                created_at: now,
                updated_at: now,
            };
            let mut welcome =
                ChatMessage::reply(id, self.settings.welcome_for(&organization.display_name));
            welcome.created_at = now;

            match self.store.create(identity, &session, &welcome).await {
                Ok(_) => {
                    info!(session_id = %id, %user_id, organization_id, "Chat session created");
                    return Ok(SessionView::new(&session, organization));
                }
                Err(RepositoryError::Conflict(reason)) => {
                    warn!(session_id = %id, attempt, %reason, "Session insert conflicted, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ChatError::DuplicateId { attempts })
    }

    /// The caller's sessions, newest first. Always empty for guests.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<SessionView>, ChatError> {
        let sessions = self.store.sessions(identity).await?;
        Ok(sessions
            .into_iter()
            .map(|(session, organization)| SessionView::new(&session, organization))
            .collect())
    }

    /// Delete an owned session and its messages.
    ///
    /// A session that does not exist and one owned by someone else both
    /// yield `NotFound`. Guests always succeed.
    pub async fn delete(&self, identity: &Identity, session_id: &Uuid) -> Result<(), ChatError> {
        if self.store.remove(identity, session_id).await? {
            if let Some(user_id) = identity.user_id() {
                info!(session_id = %session_id, %user_id, "Chat session deleted");
            }
            Ok(())
        } else {
            Err(ChatError::NotFound)
        }
    }
}
