//! History Paginator: backward, cursor-based pages of a session's messages.

use chrono::{DateTime, Utc};
use helpdesk_types::chat::{HistoryPage, MessageView, PAGE_SIZE, now_micros};
use helpdesk_types::error::ChatError;
use helpdesk_types::identity::Identity;
use uuid::Uuid;

use super::repository::{ChatRepository, OrganizationRepository};
use super::store::SessionStore;

pub struct HistoryPaginator<C: ChatRepository, O: OrganizationRepository> {
    store: SessionStore<C, O>,
}

impl<C: ChatRepository, O: OrganizationRepository> HistoryPaginator<C, O> {
    pub fn new(store: SessionStore<C, O>) -> Self {
        Self { store }
    }

    /// Load the page of messages strictly older than `cursor`.
    ///
    /// With no cursor the newest page is returned. Messages within a page
    /// are in ascending chronological order; pass the oldest one's
    /// `created_at` as the next cursor to scroll further back.
    pub async fn load(
        &self,
        identity: &Identity,
        session_id: &Uuid,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<HistoryPage, ChatError> {
        if identity.is_guest() {
            return Ok(HistoryPage::empty());
        }
        if self.store.owned_session(identity, session_id).await?.is_none() {
            return Err(ChatError::NotFound);
        }

        // Strict upper bound: nothing stored can be newer than this.
        let before = cursor.unwrap_or_else(|| now_micros() + chrono::Duration::microseconds(1));

        let mut rows = self
            .store
            .page(identity, session_id, before, PAGE_SIZE)
            .await?;
        let has_more = rows.len() == PAGE_SIZE;
        rows.reverse();

        Ok(HistoryPage {
            messages: rows.into_iter().map(MessageView::from).collect(),
            has_more,
        })
    }
}
