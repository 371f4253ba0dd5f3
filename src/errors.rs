use thiserror::Error;

#[derive(Error, Debug)]
pub enum AskRagError {
    /// Empty or malformed caller input, never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation service error: {0}")]
    GenerationService(String),

    /// A remote dependency answered with an unexpected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Config loading error: {0}")]
    ConfigLoading(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AskRagError {
    /// Whether a retry of the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingService(_) | Self::GenerationService(_) | Self::HttpError(_)
        )
    }

    /// Short machine-readable name used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInput",
            Self::EmbeddingService(_) => "EmbeddingServiceError",
            Self::GenerationService(_) => "GenerationServiceError",
            Self::InvalidResponse(_) => "InvalidResponse",
            Self::NotFound(_) => "NotFound",
            Self::Storage(_) | Self::Database(_) => "StorageError",
            Self::ConfigError(_) | Self::ConfigLoading(_) | Self::TomlParsing(_) => "ConfigError",
            Self::HttpError(_) => "HttpError",
            Self::Unauthorized(_) => "Unauthorized",
            Self::RateLimited(_) => "RateLimited",
            Self::Serialization(_) | Self::Io(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, AskRagError>;
