//! Embeddings generation module
//!
//! This module turns text into fixed-dimension vectors through a remote provider:
//! - OpenAI-compatible endpoints (text-embedding-3-small, text-embedding-ada-002, etc.)
//! - Ollama (local models)
//!
//! [`EmbeddingService`] layers a content-addressed cache, an explicit
//! [`RetryPolicy`] and dimension validation over the raw [`EmbeddingClient`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use askrag::embeddings::EmbeddingService;
//! use askrag::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed_text("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod generator;
pub mod retry;

use async_trait::async_trait;
pub use cache::EmbeddingCache;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use retry::RetryPolicy;

use crate::errors::Result;

/// Default embedding dimension for OpenAI text-embedding-3-small
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// A remote service that turns text into vectors.
///
/// Implementations report transport problems as transient errors
/// (`EmbeddingService` / `HttpError`) and malformed payloads as `InvalidResponse`.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning vectors in input order
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub cache_max_entries: Option<usize>,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        let embeddings = &config.embeddings;
        let provider = EmbeddingProvider::from_name(&embeddings.provider);

        Self {
            provider,
            model: embeddings.model.clone(),
            dimension: embeddings.dimension,
            endpoint: embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: embeddings.api_key.clone(),
            batch_size: embeddings.batch_size.max(1),
            cache_max_entries: embeddings.cache_max_entries,
            timeout_secs: embeddings.timeout_secs,
            retry: RetryPolicy::from_config(embeddings),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_app_config(&crate::config::AppConfig::default())
    }
}
