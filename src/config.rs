use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file
    pub directory: String,
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_output: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// "openai" or "ollama"
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Upper bound on cached vectors; `None` keeps every vector for the process lifetime
    pub cache_max_entries: Option<usize>,
    pub max_attempts: usize,
    pub backoff_min_secs: u64,
    pub backoff_max_secs: u64,
    pub backoff_multiplier: f64,
    pub timeout_secs: u64,
}

pub(crate) fn default_batch_size() -> usize {
    1000
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            batch_size: default_batch_size(),
            cache_max_entries: Some(10_000),
            max_attempts: 3,
            backoff_min_secs: 2,
            backoff_max_secs: 10,
            backoff_multiplier: 1.0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub llm_endpoint: String,
    pub llm_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: "https://api.openai.com/v1".to_string(),
            llm_key: None,
            llm_model: default_llm_model(),
            temperature: 0.7,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    /// JSON collection files on local disk
    Local,
    /// Postgres with the pgvector extension
    Pgvector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorStoreBackend,
    pub persist_directory: String,
    pub collection_name: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::Local,
            persist_directory: "./data/vector_store".to_string(),
            collection_name: "knowledge_base".to_string(),
            database_url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub retrieval_top_k: usize,
    /// Retrieved chunks farther than this are dropped before answering
    pub max_distance: Option<f32>,
    /// Send the rolling conversation history to the model with each question
    pub include_history: bool,
    /// Person the knowledge base describes, used in prompts and fallback answers
    pub subject: String,
    pub knowledge_base_dir: String,
    /// Ingest `knowledge_base_dir` on startup when the collection is empty
    pub auto_ingest: bool,
    pub file_extensions: Vec<String>,
    pub max_conversations: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            retrieval_top_k: 4,
            max_distance: None,
            include_history: false,
            subject: "Ashish".to_string(),
            knowledge_base_dir: "./data/knowledge_base".to_string(),
            auto_ingest: true,
            file_extensions: vec!["md".to_string(), "txt".to_string()],
            max_conversations: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// When unset, API key checks are skipped
    pub api_key: Option<String>,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_minute: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit_enabled: true,
            rate_limit_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    pub vector_store: VectorStoreConfig,
    pub rag: RagConfig,
    pub security: SecurityConfig,
}

/// Prefix for environment overrides, e.g. `ASKRAG__LLM__LLM_KEY`
pub const ENV_PREFIX: &str = "ASKRAG";

impl AppConfig {
    /// Load configuration from a TOML file, without environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file (if present) layered under environment overrides
    pub fn from_sources(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_sources(Some(Path::new("config.toml")))
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_sources(Some(Path::new("config.example.toml")))
        } else {
            Self::from_sources(None)
        }
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> crate::Result<()> {
        if self.rag.chunk_size == 0 {
            return Err(crate::AskRagError::ConfigError(
                "rag.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(crate::AskRagError::ConfigError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.embeddings.dimension == 0 {
            return Err(crate::AskRagError::ConfigError(
                "embeddings.dimension must be greater than 0".to_string(),
            ));
        }
        if self.embeddings.max_attempts == 0 {
            return Err(crate::AskRagError::ConfigError(
                "embeddings.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.rag.retrieval_top_k == 0 {
            return Err(crate::AskRagError::ConfigError(
                "rag.retrieval_top_k must be greater than 0".to_string(),
            ));
        }
        if self.vector_store.backend == VectorStoreBackend::Pgvector
            && self.vector_store.database_url.is_none()
        {
            return Err(crate::AskRagError::ConfigError(
                "vector_store.database_url is required for the pgvector backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Number of chunks retrieved per question
    pub fn retrieval_top_k(&self) -> usize {
        self.rag.retrieval_top_k
    }

    /// Whether the API key middleware is active
    pub fn api_key_required(&self) -> bool {
        self.security
            .api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }
}
