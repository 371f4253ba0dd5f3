//! Document-level operations over a [`VectorStore`]

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::VectorStore;
use crate::chunking::TextChunker;
use crate::embeddings::EmbeddingService;
use crate::errors::AskRagError;
use crate::errors::Result;
use crate::models::Metadata;
use crate::models::RetrievalResult;
use crate::models::StoredChunk;
use crate::models::META_CHUNK_INDEX;
use crate::models::META_TOTAL_CHUNKS;

/// Collection size, or the reason it could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionStats {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Chunks, embeds and stores documents; embeds queries for search
pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embeddings: Arc<EmbeddingService>,
    chunker: TextChunker,
}

impl VectorIndex {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embeddings: Arc<EmbeddingService>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            store,
            embeddings,
            chunker,
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    /// Chunk, embed and persist documents, returning one id per stored chunk.
    ///
    /// `metadatas`, when given, must pair one-to-one with `texts`; its entries
    /// are copied onto every chunk of the matching document.
    pub async fn add_documents(
        &self,
        texts: &[String],
        metadatas: Option<&[Metadata]>,
    ) -> Result<Vec<String>> {
        if let Some(metadatas) = metadatas {
            if metadatas.len() != texts.len() {
                return Err(AskRagError::InvalidInput(format!(
                    "got {} texts but {} metadata entries",
                    texts.len(),
                    metadatas.len()
                )));
            }
        }

        let mut pending: Vec<(String, Metadata)> = Vec::new();
        for (doc_index, text) in texts.iter().enumerate() {
            let base = metadatas
                .and_then(|m| m.get(doc_index))
                .cloned()
                .unwrap_or_default();

            let chunks: Vec<String> = self
                .chunker
                .split(text)
                .into_iter()
                .filter(|chunk| !chunk.trim().is_empty())
                .collect();
            let total = chunks.len();

            for (chunk_index, chunk) in chunks.into_iter().enumerate() {
                let mut metadata = base.clone();
                metadata.insert(META_CHUNK_INDEX.to_string(), json!(chunk_index));
                metadata.insert(META_TOTAL_CHUNKS.to_string(), json!(total));
                pending.push((chunk, metadata));
            }
        }

        if pending.is_empty() {
            warn!("No non-empty chunks in {} documents", texts.len());
            return Ok(Vec::new());
        }

        let chunk_texts: Vec<&str> = pending.iter().map(|(text, _)| text.as_str()).collect();
        let embeddings = self.embeddings.embed_batch(&chunk_texts).await?;

        let stored: Vec<StoredChunk> = pending
            .into_iter()
            .zip(embeddings)
            .map(|((text, metadata), embedding)| StoredChunk {
                id: Uuid::new_v4().to_string(),
                text,
                metadata,
                embedding,
            })
            .collect();
        let ids: Vec<String> = stored.iter().map(|chunk| chunk.id.clone()).collect();

        self.store.upsert(stored).await?;
        info!(
            "Added {} chunks from {} documents to '{}'",
            ids.len(),
            texts.len(),
            self.store.name()
        );
        Ok(ids)
    }

    /// Up to `k` chunks nearest to `query`, ascending by distance
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embeddings.embed_text(query).await?;
        let results = self.store.query(&embedding, k).await?;
        debug!("Similarity search returned {} results", results.len());
        Ok(results)
    }

    /// Never fails; a store error is reported inside the stats
    pub async fn collection_stats(&self) -> CollectionStats {
        let name = self.store.name().to_string();
        match self.store.count().await {
            Ok(count) => CollectionStats {
                name,
                count: Some(count),
                error: None,
            },
            Err(e) => {
                warn!("Failed to read collection stats: {}", e);
                CollectionStats {
                    name,
                    count: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Irreversibly delete every stored chunk
    pub async fn reset_collection(&self) -> Result<()> {
        self.store.delete_all().await?;
        warn!("Collection '{}' was reset", self.store.name());
        Ok(())
    }
}
