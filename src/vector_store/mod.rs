//! Persistent vector storage
//!
//! A [`VectorStore`] keeps `(chunk, metadata, embedding)` triples and answers
//! k-nearest-neighbour queries by Euclidean distance. Two backends exist:
//! - [`LocalVectorStore`]: one JSON file per collection, scanned exhaustively
//! - [`PgVectorStore`]: Postgres with the `vector` extension
//!
//! [`VectorIndex`] sits on top and handles chunking and embedding.

pub mod index;
pub mod local;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
pub use index::CollectionStats;
pub use index::VectorIndex;
pub use local::LocalVectorStore;
pub use postgres::PgVectorStore;

use crate::config::AppConfig;
use crate::config::VectorStoreBackend;
use crate::errors::Result;
use crate::models::RetrievalResult;
use crate::models::StoredChunk;

/// Backend-agnostic storage of embedded chunks
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Insert or replace chunks by id
    async fn upsert(&self, chunks: Vec<StoredChunk>) -> Result<()>;

    /// Up to `k` nearest chunks, ascending by L2 distance
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>>;

    async fn count(&self) -> Result<usize>;

    /// Remove every chunk of the collection
    async fn delete_all(&self) -> Result<()>;
}

/// Build the backend selected in configuration
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match config.vector_store.backend {
        VectorStoreBackend::Local => Arc::new(LocalVectorStore::new(
            &config.vector_store.persist_directory,
            &config.vector_store.collection_name,
        )),
        VectorStoreBackend::Pgvector => Arc::new(PgVectorStore::connect(config).await?),
    };
    Ok(store)
}

/// Euclidean distance between two vectors of equal length
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
