//! CLI output formatting utilities

use std::io::Write;

use crate::models::ChatResponse;
use crate::models::SourceDocument;
use crate::vector_store::CollectionStats;
use crate::AppConfig;

/// Truncate at a character boundary, appending "..." when shortened
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Hide the password part of a connection URL
#[must_use]
pub fn mask_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "***invalid***".to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => url.to_string(),
    }
}

fn mask_secret(secret: Option<&str>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "***set***",
        _ => "not set",
    }
}

/// Print an answer followed by confidence and optional sources
pub fn print_answer(response: &ChatResponse, show_sources: bool) {
    println!("{}", response.answer);
    println!();
    println!(
        "🎯 Confidence: {:.2} | 🤖 Model: {} | 🧮 Tokens: {}",
        response.confidence,
        response.model_used,
        response
            .tokens_used
            .map_or_else(|| "n/a".to_string(), |t| t.to_string())
    );
    println!("💬 Conversation: {}", response.conversation_id);

    if show_sources {
        print_sources(&response.sources);
    }
}

pub fn print_sources(sources: &[SourceDocument]) {
    if sources.is_empty() {
        println!("📚 No sources");
        return;
    }
    println!("📚 Sources:");
    for (i, source) in sources.iter().enumerate() {
        let name = source
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let score = source
            .relevance_score
            .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
        println!(
            "  {}. {} (relevance {}): {}",
            i + 1,
            name,
            score,
            truncate_str(&source.content.replace('\n', " "), 100)
        );
    }
}

pub fn print_collection_stats(stats: &CollectionStats) {
    println!("📊 Collection: {}", stats.name);
    match (&stats.count, &stats.error) {
        (_, Some(err)) => print_error(&format!("Store unavailable: {err}")),
        (Some(count), None) => println!("  Chunks: {count}"),
        (None, None) => println!("  Chunks: unknown"),
    }
}

pub fn print_config(config: &AppConfig) {
    println!("📋 askrag Configuration:");
    println!();

    println!("🌐 Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.enable_cors);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!(
        "  File output: {} ({})",
        config.logging.file_output, config.logging.directory
    );
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {}", config.embeddings.provider);
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  API key: {}", mask_secret(config.embeddings.api_key.as_deref()));
    println!("  Batch size: {}", config.embeddings.batch_size);
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  API key: {}", mask_secret(config.llm.llm_key.as_deref()));
    println!("  Temperature: {}", config.llm.temperature);
    println!();

    println!("🗄️  Vector store:");
    println!("  Backend: {:?}", config.vector_store.backend);
    println!("  Collection: {}", config.vector_store.collection_name);
    println!("  Directory: {}", config.vector_store.persist_directory);
    if let Some(url) = &config.vector_store.database_url {
        println!("  Database: {}", mask_database_url(url));
    }
    println!();

    println!("🔎 RAG:");
    println!("  Subject: {}", config.rag.subject);
    println!(
        "  Chunk size: {} (overlap {})",
        config.rag.chunk_size, config.rag.chunk_overlap
    );
    println!("  Top k: {}", config.retrieval_top_k());
    println!(
        "  Max distance: {}",
        config
            .rag
            .max_distance
            .map_or_else(|| "none".to_string(), |d| d.to_string())
    );
    println!("  Knowledge base: {}", config.rag.knowledge_base_dir);
    println!();

    println!("🔒 Security:");
    println!("  API key required: {}", config.api_key_required());
    println!(
        "  Rate limit: {} ({} per minute)",
        config.security.rate_limit_enabled, config.security.rate_limit_per_minute
    );
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    println!("❌ {msg}");
}

pub fn print_prompt(msg: &str) {
    print!("{msg}");
    let _ = std::io::stdout().flush();
}
