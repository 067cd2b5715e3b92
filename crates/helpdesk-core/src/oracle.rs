//! AnswerOracle trait definition.
//!
//! The oracle is the external question-answering service. It is treated as
//! best-effort: callers bound every call with a timeout and replace any
//! failure with a fallback reply.

use helpdesk_types::oracle::{AskRequest, AskResponse, OracleError};

/// Trait for answer-generation backends.
///
/// Implementations live in helpdesk-infra (e.g., `HttpAnswerOracle`).
pub trait AnswerOracle: Send + Sync {
    /// Ask a question in the context of a session.
    fn ask(
        &self,
        request: &AskRequest,
    ) -> impl std::future::Future<Output = Result<AskResponse, OracleError>> + Send;

    /// Cheap liveness probe.
    fn health(&self) -> impl std::future::Future<Output = Result<(), OracleError>> + Send;
}
