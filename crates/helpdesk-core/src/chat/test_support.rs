//! In-memory repository and oracle doubles shared by the chat unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use helpdesk_types::chat::{ChatMessage, ChatSession};
use helpdesk_types::error::RepositoryError;
use helpdesk_types::identity::UserId;
use helpdesk_types::oracle::{AskRequest, AskResponse, OracleError};
use helpdesk_types::organization::Organization;
use uuid::Uuid;

use super::repository::{ChatRepository, OrganizationRepository};
use crate::oracle::AnswerOracle;

#[derive(Default)]
struct ChatState {
    sessions: HashMap<Uuid, ChatSession>,
    messages: Vec<ChatMessage>,
}

/// Chat repository backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryChatRepository {
    state: Mutex<ChatState>,
    org_names: HashMap<i64, String>,
    /// `session_exists` answers true this many more times.
    phantom_collisions: AtomicU32,
    /// `create_session` reports a conflict this many more times.
    insert_conflicts: AtomicU32,
    fail_message_saves: AtomicBool,
    /// When failing, let this many saves through first.
    saves_before_failure: AtomicU32,
}

impl InMemoryChatRepository {
    pub fn with_organizations(orgs: &[(i64, &str)]) -> Self {
        Self {
            org_names: orgs.iter().map(|(id, n)| (*id, n.to_string())).collect(),
            ..Default::default()
        }
    }

    pub fn report_collisions(&self, times: u32) {
        self.phantom_collisions.store(times, Ordering::SeqCst);
    }

    pub fn reject_inserts(&self, times: u32) {
        self.insert_conflicts.store(times, Ordering::SeqCst);
    }

    pub fn fail_message_saves(&self, fail: bool) {
        self.fail_message_saves.store(fail, Ordering::SeqCst);
    }

    /// Fail every message save after the next `ok` succeed.
    pub fn fail_message_saves_after(&self, ok: u32) {
        self.saves_before_failure.store(ok, Ordering::SeqCst);
        self.fail_message_saves.store(true, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn messages_of(&self, session_id: &Uuid) -> Vec<ChatMessage> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        messages
    }

    pub fn session(&self, session_id: &Uuid) -> Option<ChatSession> {
        self.state.lock().unwrap().sessions.get(session_id).cloned()
    }

    /// Insert a message directly, bypassing session checks.
    pub fn seed_message(&self, message: ChatMessage) {
        self.state.lock().unwrap().messages.push(message);
    }

    fn organization(&self, id: i64) -> Organization {
        Organization {
            id,
            display_name: self
                .org_names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("org-{id}")),
        }
    }

    fn take_one(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn session_exists(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        if Self::take_one(&self.phantom_collisions) {
            return Ok(true);
        }
        Ok(self.state.lock().unwrap().sessions.contains_key(session_id))
    }

    async fn create_session(
        &self,
        session: &ChatSession,
        welcome: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        if Self::take_one(&self.insert_conflicts) {
            return Err(RepositoryError::Conflict(format!(
                "session id {} already exists",
                session.id
            )));
        }
        let mut state = self.state.lock().unwrap();
        if state.sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict(session.id.to_string()));
        }
        state.sessions.insert(session.id, session.clone());
        state.messages.push(welcome.clone());
        Ok(())
    }

    async fn get_owned_session(
        &self,
        session_id: &Uuid,
        owner_id: &UserId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .get(session_id)
            .filter(|s| &s.owner_id == owner_id)
            .cloned())
    }

    async fn list_sessions(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<(ChatSession, Organization)>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut sessions: Vec<ChatSession> = state
            .sessions
            .values()
            .filter(|s| &s.owner_id == owner_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions
            .into_iter()
            .map(|s| {
                let org = self.organization(s.organization_id);
                (s, org)
            })
            .collect())
    }

    async fn delete_session(
        &self,
        session_id: &Uuid,
        owner_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let owned = state
            .sessions
            .get(session_id)
            .is_some_and(|s| &s.owner_id == owner_id);
        if !owned {
            return Ok(false);
        }
        state.messages.retain(|m| &m.session_id != session_id);
        state.sessions.remove(session_id);
        Ok(true)
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<DateTime<Utc>, RepositoryError> {
        if self.fail_message_saves.load(Ordering::SeqCst)
            && !Self::take_one(&self.saves_before_failure)
        {
            return Err(RepositoryError::Connection);
        }
        let mut state = self.state.lock().unwrap();
        let mut stamped = message.clone();
        let newest = state
            .messages
            .iter()
            .filter(|m| m.session_id == message.session_id)
            .map(|m| m.created_at)
            .max();
        if let Some(newest) = newest.filter(|n| stamped.created_at <= *n) {
            stamped.created_at = newest + chrono::Duration::microseconds(1);
        }
        if let Some(session) = state.sessions.get_mut(&message.session_id) {
            session.updated_at = stamped.created_at;
        }
        let created_at = stamped.created_at;
        state.messages.push(stamped);
        Ok(created_at)
    }

    async fn messages_before(
        &self,
        session_id: &Uuid,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| &m.session_id == session_id && m.created_at < before)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages.truncate(limit);
        Ok(messages)
    }
}

/// Organization directory backed by a fixed list.
#[derive(Default)]
pub struct InMemoryOrganizations {
    orgs: Mutex<Vec<Organization>>,
}

impl InMemoryOrganizations {
    pub fn with(orgs: &[(i64, &str)]) -> Self {
        Self {
            orgs: Mutex::new(
                orgs.iter()
                    .map(|(id, name)| Organization {
                        id: *id,
                        display_name: name.to_string(),
                    })
                    .collect(),
            ),
        }
    }
}

impl OrganizationRepository for InMemoryOrganizations {
    async fn get(&self, id: i64) -> Result<Option<Organization>, RepositoryError> {
        Ok(self.orgs.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Organization>, RepositoryError> {
        let mut orgs = self.orgs.lock().unwrap().clone();
        orgs.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(orgs)
    }

    async fn create(&self, display_name: &str) -> Result<Organization, RepositoryError> {
        let mut orgs = self.orgs.lock().unwrap();
        if orgs.iter().any(|o| o.display_name == display_name) {
            return Err(RepositoryError::Conflict(display_name.to_string()));
        }
        let org = Organization {
            id: orgs.iter().map(|o| o.id).max().unwrap_or(0) + 1,
            display_name: display_name.to_string(),
        };
        orgs.push(org.clone());
        Ok(org)
    }
}

/// What a [`ScriptedOracle`] does when asked.
#[derive(Clone)]
pub enum Script {
    Answer(AskResponse),
    Fail(OracleError),
    /// Sleep, then answer. Used to trip the exchange timeout.
    Stall(Duration),
}

/// Oracle double that follows a fixed script and counts calls.
pub struct ScriptedOracle {
    script: Script,
    calls: AtomicUsize,
    last_request: Mutex<Option<AskRequest>>,
}

impl ScriptedOracle {
    pub fn answering(answer: &str) -> Self {
        Self::new(Script::Answer(AskResponse::text(answer)))
    }

    pub fn failing(error: OracleError) -> Self {
        Self::new(Script::Fail(error))
    }

    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AskRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl AnswerOracle for ScriptedOracle {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match self.script.clone() {
            Script::Answer(resp) => Ok(resp),
            Script::Fail(err) => Err(err),
            Script::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(AskResponse::text("too late"))
            }
        }
    }

    async fn health(&self) -> Result<(), OracleError> {
        match &self.script {
            Script::Fail(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}
