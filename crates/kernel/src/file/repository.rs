//! File record persistence.

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DepotResult;
use crate::models::File;

/// Durable storage for file records.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Create and commit a record for a stored file.
    async fn create(&self, name: &str, path: &str) -> DepotResult<File>;

    /// Look up a record by id.
    async fn find_by_id(&self, id: Uuid) -> DepotResult<Option<File>>;
}

/// PostgreSQL-backed repository.
#[derive(Debug, Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if needed.
    pub async fn ensure_schema(&self) -> DepotResult<()> {
        File::ensure_schema(&self.pool).await
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn create(&self, name: &str, path: &str) -> DepotResult<File> {
        File::create(&self.pool, name, path).await
    }

    async fn find_by_id(&self, id: Uuid) -> DepotResult<Option<File>> {
        File::find_by_id(&self.pool, id).await
    }
}

/// In-process repository, for tests and embedding without a database.
#[derive(Debug, Default)]
pub struct MemoryFileRepository {
    files: DashMap<Uuid, File>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn create(&self, name: &str, path: &str) -> DepotResult<File> {
        let file = File::new(name, path);
        self.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find_by_id(&self, id: Uuid) -> DepotResult<Option<File>> {
        Ok(self.files.get(&id).map(|entry| entry.value().clone()))
    }
}
