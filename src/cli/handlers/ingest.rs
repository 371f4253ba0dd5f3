//! Knowledge base ingestion handler

use std::path::PathBuf;
use std::time::Instant;

use crate::cli::output::*;
use crate::rag::ChatService;
use crate::AppConfig;
use crate::Result;

pub async fn handle_ingest_command(
    config: &AppConfig,
    dir: Option<PathBuf>,
    extensions: Option<Vec<String>>,
    reset: bool,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| PathBuf::from(&config.rag.knowledge_base_dir));
    let extensions = extensions.unwrap_or_else(|| config.rag.file_extensions.clone());

    let service = ChatService::from_config(config).await?;

    if reset {
        print_warning("Clearing collection before ingestion");
        service.index().reset_collection().await?;
    }

    print_info(&format!(
        "📚 Ingesting {} (extensions: {})",
        dir.display(),
        extensions.join(", ")
    ));

    let started = Instant::now();
    let added = service.ingest_directory(&dir, &extensions).await?;

    if added == 0 {
        print_warning("No chunks added; check the directory and extensions");
    } else {
        print_success(&format!(
            "Added {} chunks in {:.1}s",
            added,
            started.elapsed().as_secs_f64()
        ));
    }

    print_collection_stats(&service.index().collection_stats().await);
    Ok(())
}
