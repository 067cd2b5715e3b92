use thiserror::Error;

/// Errors surfaced by chat operations.
///
/// Answer-service failures are not listed: they stay an
/// [`OracleError`](crate::oracle::OracleError) inside the exchange and always
/// end in the fallback reply. `DuplicateId` escapes only once the id retry
/// budget is spent.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("invalid credential: {0}")]
    AuthenticationInvalid(String),

    #[error("chat not found")]
    NotFound,

    #[error("could not allocate a unique session id after {attempts} attempts")]
    DuplicateId { attempts: u32 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            other => ChatError::Storage(other.to_string()),
        }
    }
}

/// Errors from bearer credential verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no credential presented")]
    Missing,

    #[error("credential expired")]
    Expired,

    #[error("credential rejected: {0}")]
    Invalid(String),

    #[error("malformed claim: {0}")]
    MalformedClaim(String),
}

/// Errors from repository operations (used by trait definitions in helpdesk-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
