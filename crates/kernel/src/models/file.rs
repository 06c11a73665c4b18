//! Stored file record.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DepotResult;

/// A file kept in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct File {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Filename the file was stored under.
    pub name: String,

    /// Public path, always beginning with `/` (e.g. "/uploads/ba7/photo.jpg").
    pub path: String,

    /// Unix timestamp when created.
    pub created: i64,
}

impl File {
    /// Build a new record with a fresh id.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            path: path.into(),
            created: chrono::Utc::now().timestamp(),
        }
    }

    /// Create the `depot_file` table if it does not exist.
    pub async fn ensure_schema(pool: &PgPool) -> DepotResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS depot_file (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                path TEXT NOT NULL,
                created BIGINT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert a new file record.
    pub async fn create(pool: &PgPool, name: &str, path: &str) -> DepotResult<Self> {
        let record = Self::new(name, path);

        let file = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO depot_file (id, name, path, created)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, path, created
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.path)
        .bind(record.created)
        .fetch_one(pool)
        .await?;

        Ok(file)
    }

    /// Find a file record by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> DepotResult<Option<Self>> {
        let file = sqlx::query_as::<_, File>(
            "SELECT id, name, path, created FROM depot_file WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(file)
    }
}
