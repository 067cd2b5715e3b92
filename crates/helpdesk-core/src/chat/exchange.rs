//! Message Exchange: record a question, ask the oracle, return the reply.
//!
//! Members follow persist-then-call: the question is written in its own
//! unit of work before the oracle is contacted, and the reply is written in
//! a second one. No store transaction spans the oracle call, and an oracle
//! outage can never lose the question.
//!
//! The exchange is total with respect to the oracle. Timeouts, HTTP errors
//! and malformed payloads all collapse into the configured fallback reply.

use std::sync::Arc;
use std::time::Duration;

use helpdesk_types::chat::{ChatMessage, MessageView, now_micros};
use helpdesk_types::config::ChatSettings;
use helpdesk_types::error::ChatError;
use helpdesk_types::identity::Identity;
use helpdesk_types::oracle::{AskRequest, AskResponse, OracleError};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::repository::{ChatRepository, OrganizationRepository};
use super::store::SessionStore;
use crate::oracle::AnswerOracle;

pub struct MessageExchange<C: ChatRepository, O: OrganizationRepository, A: AnswerOracle> {
    store: SessionStore<C, O>,
    oracle: Arc<A>,
    settings: Arc<ChatSettings>,
    timeout: Duration,
}

impl<C, O, A> MessageExchange<C, O, A>
where
    C: ChatRepository,
    O: OrganizationRepository,
    A: AnswerOracle,
{
    pub fn new(
        store: SessionStore<C, O>,
        oracle: Arc<A>,
        settings: Arc<ChatSettings>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            oracle,
            settings,
            timeout,
        }
    }

    /// Send a question and get the reply.
    ///
    /// Errors only on empty content, on a session the caller does not own,
    /// or when the question itself cannot be stored.
    pub async fn send(
        &self,
        identity: &Identity,
        session_id: Uuid,
        content: &str,
    ) -> Result<MessageView, ChatError> {
        let question = content.trim();
        if question.is_empty() {
            return Err(ChatError::Validation("message must not be empty".to_string()));
        }

        match identity {
            Identity::Guest { .. } => {
                let answer = self.answer(session_id, question).await;
                Ok(MessageView {
                    id: None,
                    chat_id: session_id,
                    is_ask: false,
                    content: answer,
                    created_at: now_micros(),
                })
            }
            Identity::Authenticated { user_id } => {
                if self.store.owned_session(identity, &session_id).await?.is_none() {
                    return Err(ChatError::NotFound);
                }

                let mut ask = ChatMessage::ask(session_id, question);
                self.store.append(identity, &mut ask).await?;
                debug!(session_id = %session_id, %user_id, "Question stored");

                let answer = self.answer(session_id, question).await;

                let mut reply = ChatMessage::reply(session_id, answer);
                if reply.created_at <= ask.created_at {
                    reply.created_at = ask.created_at + chrono::Duration::microseconds(1);
                }

                match self.store.append(identity, &mut reply).await {
                    Ok(_) => Ok(MessageView::from(reply)),
                    Err(e) => {
                        error!(session_id = %session_id, error = %e, "Failed to store reply");
                        let mut view = MessageView::from(reply);
                        view.id = None;
                        Ok(view)
                    }
                }
            }
        }
    }

    /// Ask the oracle under the timeout, falling back on any failure.
    async fn answer(&self, session_id: Uuid, question: &str) -> String {
        let request = AskRequest {
            session_id,
            question: question.to_string(),
        };

        let outcome = match tokio::time::timeout(self.timeout, self.oracle.ask(&request)).await {
            Ok(Ok(resp)) if resp.answer.trim().is_empty() => Err(OracleError::EmptyAnswer),
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(resp) => self.render(resp),
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    kind = e.kind(),
                    error = %e,
                    "Answer oracle failed, replying with fallback"
                );
                self.settings.fallback_answer.clone()
            }
        }
    }

    fn render(&self, resp: AskResponse) -> String {
        match resp.citations() {
            Some(citations) if self.settings.append_citations => {
                format!("{}\n\nSources:\n{}", resp.answer.trim(), citations)
            }
            _ => resp.answer.trim().to_string(),
        }
    }
}
