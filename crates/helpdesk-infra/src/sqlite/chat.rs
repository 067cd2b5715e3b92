//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `helpdesk-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool, and every multi-statement write inside one writer transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use helpdesk_core::chat::repository::ChatRepository;
use helpdesk_types::chat::{ChatMessage, ChatSession};
use helpdesk_types::error::RepositoryError;
use helpdesk_types::identity::UserId;
use helpdesk_types::organization::Organization;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    owner_id: String,
    organization_id: i64,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            organization_id: row.try_get("organization_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;

        Ok(ChatSession {
            id,
            owner_id: UserId::new(self.owner_id),
            organization_id: self.organization_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    is_ask: bool,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            is_ask: row.try_get("is_ask")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;

        Ok(ChatMessage {
            id,
            session_id,
            is_ask: self.is_ask,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC form, so `created_at < ?` in SQL orders chronologically.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

/// Unique-constraint violations become `Conflict`, everything else `Query`.
pub(super) fn insert_error(e: sqlx::Error) -> RepositoryError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => RepositoryError::Conflict(db.message().to_string()),
        _ => query_error(e),
    }
}

async fn insert_message(
    conn: &mut sqlx::SqliteConnection,
    message: &ChatMessage,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"INSERT INTO chat_messages (id, session_id, is_ask, content, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(message.id.to_string())
    .bind(message.session_id.to_string())
    .bind(message.is_ask)
    .bind(&message.content)
    .bind(format_datetime(&message.created_at))
    .execute(conn)
    .await
    .map_err(insert_error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn session_exists(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(row.is_some())
    }

    async fn create_session(
        &self,
        session: &ChatSession,
        welcome: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO chat_sessions (id, owner_id, organization_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.owner_id.as_str())
        .bind(session.organization_id)
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(insert_error)?;

        insert_message(&mut *tx, welcome).await?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn get_owned_session(
        &self,
        session_id: &Uuid,
        owner_id: &UserId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(session_id.to_string())
            .bind(owner_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_error)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<(ChatSession, Organization)>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.*, o.display_name AS organization_name
               FROM chat_sessions s
               JOIN organizations o ON o.id = s.organization_id
               WHERE s.owner_id = ?
               ORDER BY s.created_at DESC"#,
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let display_name: String = row.try_get("organization_name").map_err(query_error)?;
            let session = ChatSessionRow::from_row(row)
                .map_err(query_error)?
                .into_session()?;
            let organization = Organization {
                id: session.organization_id,
                display_name,
            };
            sessions.push((session, organization));
        }

        Ok(sessions)
    }

    async fn delete_session(
        &self,
        session_id: &Uuid,
        owner_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let id = session_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let owned = sqlx::query("SELECT 1 FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(&id)
            .bind(owner_id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        if owned.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM chat_messages WHERE session_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(true)
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<DateTime<Utc>, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let newest: Option<String> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM chat_messages WHERE session_id = ?")
                .bind(message.session_id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(query_error)?;

        let mut stamped = message.clone();
        if let Some(newest) = newest {
            let newest = parse_datetime(&newest)?;
            if stamped.created_at <= newest {
                stamped.created_at = newest + chrono::Duration::microseconds(1);
            }
        }

        insert_message(&mut *tx, &stamped).await?;

        let result = sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&stamped.created_at))
            .bind(message.session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(query_error)?;
        Ok(stamped.created_at)
    }

    async fn messages_before(
        &self,
        session_id: &Uuid,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM chat_messages
               WHERE session_id = ? AND created_at < ?
               ORDER BY created_at DESC, id DESC
               LIMIT ?"#,
        )
        .bind(session_id.to_string())
        .bind(format_datetime(&before))
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = ChatMessageRow::from_row(row).map_err(query_error)?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::organization::SqliteOrganizationRepository;
    use crate::sqlite::pool::DatabasePool;
    use helpdesk_core::chat::repository::OrganizationRepository;
    use helpdesk_types::chat::now_micros;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn setup() -> (SqliteChatRepository, Organization) {
        let pool = test_pool().await;
        let org = SqliteOrganizationRepository::new(pool.clone())
            .create("Registrar")
            .await
            .unwrap();
        (SqliteChatRepository::new(pool), org)
    }

    fn make_session(owner: &str, org: &Organization) -> (ChatSession, ChatMessage) {
        let now = now_micros();
        let session = ChatSession {
            id: Uuid::new_v4(),
            owner_id: UserId::new(owner),
            organization_id: org.id,
            title: "Transcripts".to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut welcome = ChatMessage::reply(session.id, "Hello, I am the Registrar assistant.");
        welcome.created_at = now;
        (session, welcome)
    }

    #[tokio::test]
    async fn test_create_and_get_owned_session() {
        let (repo, org) = setup().await;
        let (session, welcome) = make_session("alice", &org);
        repo.create_session(&session, &welcome).await.unwrap();

        assert!(repo.session_exists(&session.id).await.unwrap());
        let owned = repo
            .get_owned_session(&session.id, &UserId::new("alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owned, session);

        let foreign = repo
            .get_owned_session(&session.id, &UserId::new("bob"))
            .await
            .unwrap();
        assert!(foreign.is_none());

        let messages = repo
            .messages_before(&session.id, now_micros() + chrono::Duration::seconds(1), 20)
            .await
            .unwrap();
        assert_eq!(messages, vec![welcome]);
    }

    #[tokio::test]
    async fn test_duplicate_session_id_is_conflict_and_atomic() {
        let (repo, org) = setup().await;
        let (session, welcome) = make_session("alice", &org);
        repo.create_session(&session, &welcome).await.unwrap();

        let (mut dup, dup_welcome) = make_session("bob", &org);
        dup.id = session.id;
        let mut dup_welcome = dup_welcome;
        dup_welcome.session_id = session.id;

        let err = repo.create_session(&dup, &dup_welcome).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        // The rolled-back welcome must not have leaked into the original session.
        let messages = repo
            .messages_before(&session.id, now_micros() + chrono::Duration::seconds(1), 20)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_list_sessions_newest_first_with_org() {
        let (repo, org) = setup().await;
        let (older, w1) = make_session("alice", &org);
        repo.create_session(&older, &w1).await.unwrap();
        let (mut newer, mut w2) = make_session("alice", &org);
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        w2.created_at = newer.created_at;
        repo.create_session(&newer, &w2).await.unwrap();
        let (other, w3) = make_session("bob", &org);
        repo.create_session(&other, &w3).await.unwrap();

        let listed = repo.list_sessions(&UserId::new("alice")).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|(s, _)| s.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(listed[0].1.display_name, "Registrar");
    }

    #[tokio::test]
    async fn test_delete_session_checks_owner_and_cascades() {
        let (repo, org) = setup().await;
        let (session, welcome) = make_session("alice", &org);
        repo.create_session(&session, &welcome).await.unwrap();
        repo.save_message(&ChatMessage::ask(session.id, "hi"))
            .await
            .unwrap();

        assert!(
            !repo
                .delete_session(&session.id, &UserId::new("mallory"))
                .await
                .unwrap()
        );
        assert!(repo.session_exists(&session.id).await.unwrap());

        assert!(
            repo.delete_session(&session.id, &UserId::new("alice"))
                .await
                .unwrap()
        );
        assert!(!repo.session_exists(&session.id).await.unwrap());
        let messages = repo
            .messages_before(&session.id, now_micros() + chrono::Duration::seconds(1), 20)
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_save_message_bumps_updated_at() {
        let (repo, org) = setup().await;
        let (session, welcome) = make_session("alice", &org);
        repo.create_session(&session, &welcome).await.unwrap();

        let mut ask = ChatMessage::ask(session.id, "When is the deadline?");
        ask.created_at = session.created_at + chrono::Duration::seconds(30);
        let stamped = repo.save_message(&ask).await.unwrap();
        assert_eq!(stamped, ask.created_at);

        let stored = repo
            .get_owned_session(&session.id, &UserId::new("alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.updated_at, ask.created_at);
        assert_eq!(stored.created_at, session.created_at);
    }

    #[tokio::test]
    async fn test_save_message_for_missing_session_fails() {
        let (repo, _) = setup().await;
        let err = repo
            .save_message(&ChatMessage::ask(Uuid::new_v4(), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Query(_) | RepositoryError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_messages_before_is_strict_and_limited() {
        let (repo, org) = setup().await;
        let (session, welcome) = make_session("alice", &org);
        repo.create_session(&session, &welcome).await.unwrap();

        let mut stamps = Vec::new();
        for i in 0..5 {
            let mut msg = ChatMessage::ask(session.id, format!("m{i}"));
            msg.created_at = session.created_at + chrono::Duration::milliseconds(10 * (i + 1));
            stamps.push(msg.created_at);
            repo.save_message(&msg).await.unwrap();
        }

        let page = repo.messages_before(&session.id, stamps[4], 3).await.unwrap();
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m2", "m1"]);

        let rest = repo.messages_before(&session.id, stamps[1], 10).await.unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].content, "m0");
        assert!(!rest[1].is_ask);
    }

    #[tokio::test]
    async fn test_save_message_breaks_timestamp_ties() {
        let (repo, org) = setup().await;
        let (session, welcome) = make_session("alice", &org);
        repo.create_session(&session, &welcome).await.unwrap();

        let at = session.created_at + chrono::Duration::seconds(1);
        let mut first = ChatMessage::ask(session.id, "first");
        first.created_at = at;
        let mut second = ChatMessage::ask(session.id, "second");
        second.created_at = at;
        // Older than everything stored so far.
        let mut late = ChatMessage::reply(session.id, "late");
        late.created_at = session.created_at - chrono::Duration::seconds(1);

        let s1 = repo.save_message(&first).await.unwrap();
        let s2 = repo.save_message(&second).await.unwrap();
        let s3 = repo.save_message(&late).await.unwrap();
        assert_eq!(s1, at);
        assert_eq!(s2, at + chrono::Duration::microseconds(1));
        assert_eq!(s3, s2 + chrono::Duration::microseconds(1));

        let stored = repo
            .get_owned_session(&session.id, &UserId::new("alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.updated_at, s3);
    }

    #[tokio::test]
    async fn test_chained_pages_cover_tied_messages() {
        let (repo, org) = setup().await;
        let (session, welcome) = make_session("alice", &org);
        repo.create_session(&session, &welcome).await.unwrap();

        // Two concurrent questions stamped with the same instant, then 19 newer
        // messages: the tie lands right on the first page boundary.
        let tie = session.created_at + chrono::Duration::milliseconds(1);
        for content in ["tie-a", "tie-b"] {
            let mut msg = ChatMessage::ask(session.id, content);
            msg.created_at = tie;
            repo.save_message(&msg).await.unwrap();
        }
        for i in 0..19 {
            let mut msg = ChatMessage::reply(session.id, format!("r{i}"));
            msg.created_at = tie + chrono::Duration::seconds(i + 1);
            repo.save_message(&msg).await.unwrap();
        }

        let mut cursor = now_micros() + chrono::Duration::seconds(60);
        let mut seen = Vec::new();
        loop {
            let page = repo.messages_before(&session.id, cursor, 20).await.unwrap();
            let Some(oldest) = page.last() else { break };
            cursor = oldest.created_at;
            let full = page.len() == 20;
            seen.extend(page.into_iter().map(|m| m.id));
            if !full {
                break;
            }
        }

        assert_eq!(seen.len(), 22);
        let unique: std::collections::HashSet<Uuid> = seen.iter().copied().collect();
        assert_eq!(unique.len(), 22);
    }
}
