//! Unit tests for configuration module
//!
//! These tests validate configuration parsing, defaults, and validation.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::config::*;

    // ====== Default Value Tests ======

    #[test]
    fn test_default_rag_settings() {
        let config = AppConfig::default();
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.rag.retrieval_top_k, 4);
        assert!(!config.rag.include_history);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_retry_schedule() {
        let config = EmbeddingsConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_min_secs, 2);
        assert_eq!(config.backoff_max_secs, 10);
        assert!((config.backoff_multiplier - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_batch_size() {
        assert_eq!(default_batch_size(), 1000);
    }

    #[test]
    fn test_api_key_not_required_by_default() {
        let config = AppConfig::default();
        assert!(!config.api_key_required());
    }

    #[test]
    fn test_empty_api_key_is_not_required() {
        let mut config = AppConfig::default();
        config.security.api_key = Some(String::new());
        assert!(!config.api_key_required());
        config.security.api_key = Some("secret".to_string());
        assert!(config.api_key_required());
    }

    // ====== Validation Tests ======

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = AppConfig::default();
        config.rag.chunk_overlap = config.rag.chunk_size;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = AppConfig::default();
        config.rag.retrieval_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pgvector_requires_database_url() {
        let mut config = AppConfig::default();
        config.vector_store.backend = VectorStoreBackend::Pgvector;
        assert!(config.validate().is_err());

        config.vector_store.database_url = Some("postgres://localhost/askrag".to_string());
        assert!(config.validate().is_ok());
    }

    // ====== Parsing Tests ======

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            [llm]
            llm_model = "gpt-4o-mini"

            [rag]
            retrieval_top_k = 6
            subject = "Grace"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.llm_model, "gpt-4o-mini");
        assert_eq!(config.rag.retrieval_top_k, 6);
        assert_eq!(config.rag.subject, "Grace");
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.embeddings.dimension, 1536);
        assert_eq!(config.vector_store.backend, VectorStoreBackend::Local);
    }

    #[test]
    fn test_backend_parses_lowercase() {
        let toml_str = r#"
            [vector_store]
            backend = "pgvector"
            database_url = "postgres://localhost/askrag"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.vector_store.backend, VectorStoreBackend::Pgvector);
    }

    #[test]
    fn test_from_file_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rag]\nchunk_size = 100\nchunk_overlap = 150").unwrap();

        let result = AppConfig::from_file(file.path());
        assert!(matches!(result, Err(crate::AskRagError::ConfigError(_))));
    }

    #[test]
    fn test_from_sources_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();

        let config = AppConfig::from_sources(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9100);
    }
}
