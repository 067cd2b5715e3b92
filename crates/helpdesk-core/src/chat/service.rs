//! Chat service facade.
//!
//! ChatService wires the Session Manager, Message Exchange and History
//! Paginator over one shared [`SessionStore`], so the transport layer holds a
//! single handle per process.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use helpdesk_types::chat::{HistoryPage, MessageView, SessionView};
use helpdesk_types::config::ChatSettings;
use helpdesk_types::error::ChatError;
use helpdesk_types::identity::Identity;
use helpdesk_types::oracle::OracleError;
use helpdesk_types::organization::Organization;
use uuid::Uuid;

use super::exchange::MessageExchange;
use super::history::HistoryPaginator;
use super::repository::{ChatRepository, OrganizationRepository};
use super::session::SessionManager;
use super::store::SessionStore;
use crate::oracle::AnswerOracle;

pub struct ChatService<C: ChatRepository, O: OrganizationRepository, A: AnswerOracle> {
    organizations: Arc<O>,
    oracle: Arc<A>,
    oracle_timeout: Duration,
    sessions: SessionManager<C, O>,
    exchange: MessageExchange<C, O, A>,
    history: HistoryPaginator<C, O>,
}

impl<C, O, A> ChatService<C, O, A>
where
    C: ChatRepository,
    O: OrganizationRepository,
    A: AnswerOracle,
{
    pub fn new(
        chats: Arc<C>,
        organizations: Arc<O>,
        oracle: Arc<A>,
        settings: ChatSettings,
        oracle_timeout: Duration,
    ) -> Self {
        let settings = Arc::new(settings);
        let store = SessionStore::new(chats, Arc::clone(&organizations));
        Self {
            sessions: SessionManager::new(store.clone(), Arc::clone(&settings)),
            exchange: MessageExchange::new(
                store.clone(),
                Arc::clone(&oracle),
                settings,
                oracle_timeout,
            ),
            history: HistoryPaginator::new(store),
            organizations,
            oracle,
            oracle_timeout,
        }
    }

    pub async fn start(
        &self,
        identity: &Identity,
        organization_id: i64,
        title: &str,
    ) -> Result<SessionView, ChatError> {
        self.sessions.create(identity, organization_id, title).await
    }

    pub async fn active(&self, identity: &Identity) -> Result<Vec<SessionView>, ChatError> {
        self.sessions.list(identity).await
    }

    pub async fn delete(&self, identity: &Identity, session_id: &Uuid) -> Result<(), ChatError> {
        self.sessions.delete(identity, session_id).await
    }

    pub async fn send(
        &self,
        identity: &Identity,
        session_id: Uuid,
        content: &str,
    ) -> Result<MessageView, ChatError> {
        self.exchange.send(identity, session_id, content).await
    }

    pub async fn load(
        &self,
        identity: &Identity,
        session_id: &Uuid,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<HistoryPage, ChatError> {
        self.history.load(identity, session_id, cursor).await
    }

    /// Every organization a chat can be started for, by name.
    pub async fn organizations(&self) -> Result<Vec<Organization>, ChatError> {
        Ok(self.organizations.list().await?)
    }

    /// Probe the oracle under the same timeout as a real question.
    pub async fn oracle_health(&self) -> Result<(), OracleError> {
        match tokio::time::timeout(self.oracle_timeout, self.oracle.health()).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.oracle_timeout.as_millis() as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::test_support::{
        InMemoryChatRepository, InMemoryOrganizations, ScriptedOracle,
    };
    use helpdesk_types::identity::GuestId;

    fn service(
        oracle: ScriptedOracle,
    ) -> ChatService<InMemoryChatRepository, InMemoryOrganizations, ScriptedOracle> {
        ChatService::new(
            Arc::new(InMemoryChatRepository::with_organizations(&[(3, "Housing")])),
            Arc::new(InMemoryOrganizations::with(&[(3, "Housing"), (1, "Admissions")])),
            Arc::new(oracle),
            ChatSettings::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_member_round_trip() {
        let svc = service(ScriptedOracle::answering("Room swaps open in June."));
        let bob = Identity::authenticated("bob");

        let chat = svc.start(&bob, 3, "Dorms").await.unwrap();
        let reply = svc.send(&bob, chat.id, "Can I switch rooms?").await.unwrap();
        assert_eq!(reply.content, "Room swaps open in June.");

        let page = svc.load(&bob, &chat.id, None).await.unwrap();
        let contents: Vec<&str> = page.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], "Can I switch rooms?");
        assert_eq!(contents[2], "Room swaps open in June.");

        assert_eq!(svc.active(&bob).await.unwrap().len(), 1);
        svc.delete(&bob, &chat.id).await.unwrap();
        assert!(svc.active(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guest_send_then_list_is_empty() {
        let svc = service(ScriptedOracle::answering("9 to 5"));
        let guest = Identity::guest(GuestId::new());

        let chat = svc.start(&guest, 3, "Hours").await.unwrap();
        let reply = svc.send(&guest, chat.id, "What are office hours?").await.unwrap();
        assert!(!reply.is_ask);
        assert!(svc.active(&guest).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_organizations_sorted_by_name() {
        let svc = service(ScriptedOracle::answering("x"));
        let names: Vec<String> = svc
            .organizations()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.display_name)
            .collect();
        assert_eq!(names, vec!["Admissions", "Housing"]);
    }

    #[tokio::test]
    async fn test_oracle_health_reports_failure() {
        let svc = service(ScriptedOracle::failing(OracleError::Transport(
            "connection refused".to_string(),
        )));
        assert!(svc.oracle_health().await.is_err());

        let svc = service(ScriptedOracle::answering("x"));
        assert!(svc.oracle_health().await.is_ok());
    }
}
