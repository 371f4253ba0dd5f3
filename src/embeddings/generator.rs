//! Embedding generation service with caching, retries and batch processing

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use super::cache::EmbeddingCache;
use super::client::EmbeddingClient;
use super::EmbeddingBackend;
use super::EmbeddingConfig;
use crate::errors::AskRagError;
use crate::errors::Result;

/// Service for generating embeddings with caching and optimization
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
    cache: EmbeddingCache,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config))
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::from_config(&config)?;
        info!(
            "Embedding service using {:?} model {} ({} dims)",
            config.provider, config.model, config.dimension
        );
        Ok(Self::with_backend(Arc::new(client), config))
    }

    /// Create over an arbitrary backend
    pub fn with_backend(backend: Arc<dyn EmbeddingBackend>, config: EmbeddingConfig) -> Self {
        Self {
            backend,
            cache: EmbeddingCache::new(config.cache_max_entries),
            config,
        }
    }

    /// Embed one text, consulting and filling the cache
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text_with(text, true).await
    }

    pub async fn embed_text_with(&self, text: &str, use_cache: bool) -> Result<Vec<f32>> {
        ensure_not_blank(text)?;

        if use_cache {
            if let Some(embedding) = self.cache.get(text) {
                debug!("Embedding cache hit");
                return Ok(embedding);
            }
        }

        let embedding = self
            .config
            .retry
            .run("embed", || async {
                let embedding = self.backend.embed(text).await?;
                self.check_dimension(&embedding)?;
                Ok(embedding)
            })
            .await
            .map_err(surface_failure)?;

        if use_cache {
            self.cache.insert(text, embedding.clone());
        }
        Ok(embedding)
    }

    /// Embed several texts, returning vectors in input order
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch_with(texts, true).await
    }

    pub async fn embed_batch_with(&self, texts: &[&str], use_cache: bool) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            ensure_not_blank(text)?;
        }

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut uncached: Vec<usize> = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            match use_cache.then(|| self.cache.get(text)).flatten() {
                Some(embedding) => results[i] = Some(embedding),
                None => uncached.push(i),
            }
        }

        debug!(
            "Embedding batch of {}: {} cached, {} to fetch",
            texts.len(),
            texts.len() - uncached.len(),
            uncached.len()
        );

        for positions in uncached.chunks(self.config.batch_size) {
            let batch: Vec<&str> = positions.iter().map(|&i| texts[i]).collect();
            let embeddings = self
                .config
                .retry
                .run("embed batch", || async {
                    let embeddings = self.backend.embed_batch(&batch).await?;
                    if embeddings.len() != batch.len() {
                        return Err(AskRagError::InvalidResponse(format!(
                            "expected {} embeddings, got {}",
                            batch.len(),
                            embeddings.len()
                        )));
                    }
                    for embedding in &embeddings {
                        self.check_dimension(embedding)?;
                    }
                    Ok(embeddings)
                })
                .await
                .map_err(surface_failure)?;

            for (&i, embedding) in positions.iter().zip(embeddings) {
                if use_cache {
                    self.cache.insert(texts[i], embedding.clone());
                }
                results[i] = Some(embedding);
            }
        }

        results
            .into_iter()
            .map(|embedding| {
                embedding.ok_or_else(|| {
                    AskRagError::InvalidResponse("missing embedding in batch".to_string())
                })
            })
            .collect()
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Embedding cache cleared");
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Get the embedding dimension
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.config.dimension {
            return Err(AskRagError::InvalidResponse(format!(
                "embedding dimension {} does not match configured {}",
                embedding.len(),
                self.config.dimension
            )));
        }
        Ok(())
    }
}

fn ensure_not_blank(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(AskRagError::InvalidInput(
            "cannot embed empty text".to_string(),
        ));
    }
    Ok(())
}

/// Exhausted transport failures are reported as embedding service failures
fn surface_failure(err: AskRagError) -> AskRagError {
    match err {
        AskRagError::HttpError(msg) => AskRagError::EmbeddingService(msg),
        other => other,
    }
}
