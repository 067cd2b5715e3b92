//! SQLite organization directory.

use helpdesk_core::chat::repository::OrganizationRepository;
use helpdesk_types::error::RepositoryError;
use helpdesk_types::organization::Organization;
use sqlx::Row;

use super::chat::insert_error;
use super::pool::DatabasePool;

pub struct SqliteOrganizationRepository {
    pool: DatabasePool,
}

impl SqliteOrganizationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn organization_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Organization, RepositoryError> {
    Ok(Organization {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        display_name: row
            .try_get("display_name")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
    })
}

impl OrganizationRepository for SqliteOrganizationRepository {
    async fn get(&self, id: i64) -> Result<Option<Organization>, RepositoryError> {
        let row = sqlx::query("SELECT id, display_name FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(organization_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Organization>, RepositoryError> {
        let rows = sqlx::query("SELECT id, display_name FROM organizations ORDER BY display_name")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(organization_from_row).collect()
    }

    async fn create(&self, display_name: &str) -> Result<Organization, RepositoryError> {
        let result = sqlx::query("INSERT INTO organizations (display_name) VALUES (?)")
            .bind(display_name)
            .execute(&self.pool.writer)
            .await
            .map_err(insert_error)?;

        Ok(Organization {
            id: result.last_insert_rowid(),
            display_name: display_name.to_string(),
        })
    }
}
