//! Storage ports for chats and organizations.
//!
//! Same RPITIT style as the oracle and credential ports: native async fn in
//! traits, implementations live in helpdesk-infra.

use chrono::{DateTime, Utc};
use helpdesk_types::chat::{ChatMessage, ChatSession};
use helpdesk_types::error::RepositoryError;
use helpdesk_types::identity::UserId;
use helpdesk_types::organization::Organization;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Only authenticated sessions ever reach an implementation; guest
/// sessions are filtered out by [`SessionStore`](super::store::SessionStore).
pub trait ChatRepository: Send + Sync {
    /// Whether a session with this id exists (any owner).
    fn session_exists(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Insert a session together with its welcome message as one atomic unit.
    ///
    /// Returns `RepositoryError::Conflict` when the id is already taken; the
    /// store's uniqueness constraint is the final arbiter.
    fn create_session(
        &self,
        session: &ChatSession,
        welcome: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a session only if it belongs to `owner_id`.
    fn get_owned_session(
        &self,
        session_id: &Uuid,
        owner_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Sessions owned by `owner_id` with their organizations, newest first.
    fn list_sessions(
        &self,
        owner_id: &UserId,
    ) -> impl std::future::Future<
        Output = Result<Vec<(ChatSession, Organization)>, RepositoryError>,
    > + Send;

    /// Delete an owned session and all its messages atomically.
    ///
    /// Returns `Ok(false)` when no session matched `(id, owner)`.
    fn delete_session(
        &self,
        session_id: &Uuid,
        owner_id: &UserId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Save a message and bump its session's `updated_at`.
    ///
    /// `created_at` is moved 1µs past the session's newest message when it
    /// would not sort strictly after it, so timestamps within a session are
    /// unique and the history cursor never splits a tie. Returns the
    /// timestamp actually stored.
    fn save_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<DateTime<Utc>, RepositoryError>> + Send;

    /// Up to `limit` messages created strictly before `before`, newest first.
    fn messages_before(
        &self,
        session_id: &Uuid,
        before: DateTime<Utc>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}

/// Read access to the organization directory, plus the seeding operations
/// the operator CLI uses.
pub trait OrganizationRepository: Send + Sync {
    fn get(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Organization>, RepositoryError>> + Send;

    /// All organizations ordered by display name.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Organization>, RepositoryError>> + Send;

    /// Insert an organization. `Conflict` if the display name exists.
    fn create(
        &self,
        display_name: &str,
    ) -> impl std::future::Future<Output = Result<Organization, RepositoryError>> + Send;
}
