
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::{RagError, Result};

pub type DbPool = Pool<Sqlite>;

/// Full document record as stored in SQLite.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Listing row without the full content payload.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DocumentSummary {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Document metadata database backed by SQLite.
#[derive(Debug, Clone)]
pub struct DocumentDatabase {
    pool: DbPool,
}

impl DocumentDatabase {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(|e| RagError::Config(format!("Failed to create connection pool: {e}")))?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Idempotent: re-running applied migrations is a no-op.
    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running document database migrations");

        sqlx::migrate!("src/store/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RagError::Config(format!("Failed to run schema migration: {e}")))?;

        debug!("Document database migrations completed successfully");
        Ok(())
    }

    /// Check that the documents table has been provisioned.
    #[inline]
    pub async fn is_provisioned(&self) -> Result<bool> {
        let table: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RagError::StoreRead(format!("Failed to inspect schema: {e}")))?;

        Ok(table.is_some())
    }

    #[inline]
    pub async fn insert(&self, name: &str, content: &str) -> Result<i64> {
        if name.trim().is_empty() {
            return Err(RagError::StoreWrite(
                "Document name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let id = sqlx::query("INSERT INTO documents (name, content, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(content)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| RagError::StoreWrite(format!("Failed to insert document: {e}")))?
            .last_insert_rowid();

        debug!("Inserted document {} ({})", id, name);
        Ok(id)
    }

    #[inline]
    pub async fn get(&self, id: i64) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(
            "SELECT id, name, content, created_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RagError::StoreRead(format!("Failed to get document {id}: {e}")))?;

        document.ok_or_else(|| RagError::NotFound(format!("No document with id {id}")))
    }

    #[inline]
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RagError::StoreRead(format!("Failed to check document {id}: {e}")))?;

        Ok(found.is_some())
    }

    /// Ids of all documents with this exact name, oldest first.
    #[inline]
    pub async fn ids_by_name(&self, name: &str) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar("SELECT id FROM documents WHERE name = ? ORDER BY id")
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                RagError::StoreRead(format!("Failed to look up documents named '{name}': {e}"))
            })?;

        Ok(ids)
    }

    #[inline]
    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let documents = sqlx::query_as::<_, DocumentSummary>(
            "SELECT id, name, created_at FROM documents ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RagError::StoreRead(format!("Failed to list documents: {e}")))?;

        Ok(documents)
    }

    /// Delete succeeds silently when no row matches; callers needing a
    /// precise NotFound must check existence first.
    #[inline]
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RagError::StoreWrite(format!("Failed to delete document {id}: {e}")))?;

        debug!("Deleted document {}", id);
        Ok(())
    }

    #[inline]
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RagError::StoreRead(format!("Failed to count documents: {e}")))?;

        Ok(count.unsigned_abs())
    }
}
