//! Postgres + pgvector backed store

use async_trait::async_trait;
use ::pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use super::VectorStore;
use crate::config::AppConfig;
use crate::errors::AskRagError;
use crate::errors::Result;
use crate::models::Metadata;
use crate::models::RetrievalResult;
use crate::models::StoredChunk;

/// One table per collection, created on first use
pub struct PgVectorStore {
    pool: PgPool,
    name: String,
    table: String,
    dimension: usize,
    schema_ready: OnceCell<()>,
}

impl PgVectorStore {
    #[must_use]
    pub fn new(pool: PgPool, collection: &str, dimension: usize) -> Self {
        Self {
            pool,
            name: collection.to_string(),
            table: table_name(collection),
            dimension,
            schema_ready: OnceCell::new(),
        }
    }

    /// Create a store from configuration
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let url = config.vector_store.database_url.as_deref().ok_or_else(|| {
            AskRagError::ConfigError("vector_store.database_url is required for pgvector".to_string())
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.vector_store.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(url)
            .await?;

        info!(
            "pgvector pool configured: max_connections={}",
            config.vector_store.max_connections
        );

        Ok(Self::new(
            pool,
            &config.vector_store.collection_name,
            config.embedding_dimension(),
        ))
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
                    .execute(&self.pool)
                    .await?;

                let ddl = format!(
                    r"
                    CREATE TABLE IF NOT EXISTS {} (
                        id TEXT PRIMARY KEY,
                        content TEXT NOT NULL,
                        metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                        embedding vector({}) NOT NULL
                    )
                    ",
                    self.table, self.dimension
                );
                sqlx::query(&ddl).execute(&self.pool).await?;

                debug!("Ensured pgvector table {}", self.table);
                Ok::<(), AskRagError>(())
            })
            .await?;
        Ok(())
    }
}

/// Collection names become identifiers, so keep them to `[a-z0-9_]`
fn table_name(collection: &str) -> String {
    let cleaned: String = collection
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("rag_chunks_{cleaned}")
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, chunks: Vec<StoredChunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        self.ensure_schema().await?;

        let sql = format!(
            r"
            INSERT INTO {} (id, content, metadata, embedding)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET content = EXCLUDED.content,
                metadata = EXCLUDED.metadata,
                embedding = EXCLUDED.embedding
            ",
            self.table
        );

        let count = chunks.len();
        let mut tx = self.pool.begin().await?;
        for chunk in chunks {
            sqlx::query(&sql)
                .bind(&chunk.id)
                .bind(&chunk.text)
                .bind(Json(&chunk.metadata))
                .bind(Vector::from(chunk.embedding))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("Upserted {} chunks into {}", count, self.table);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.ensure_schema().await?;

        let sql = format!(
            r"
            SELECT content, metadata, (embedding <-> $1) AS distance
            FROM {}
            ORDER BY embedding <-> $1
            LIMIT $2
            ",
            self.table
        );

        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, (String, Json<Metadata>, f64)>(&sql)
            .bind(Vector::from(embedding.to_vec()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(text, Json(metadata), distance)| RetrievalResult {
                text,
                metadata,
                distance: distance as f32,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        self.ensure_schema().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn delete_all(&self) -> Result<()> {
        self.ensure_schema().await?;
        let sql = format!("DELETE FROM {}", self.table);
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        info!(
            "Deleted {} chunks from {}",
            result.rows_affected(),
            self.table
        );
        Ok(())
    }
}
