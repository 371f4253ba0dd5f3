//! Knowledge base ingestion from a directory tree

use std::path::Path;

use serde_json::json;
use tracing::error;
use tracing::info;
use tracing::warn;
use walkdir::WalkDir;

use crate::errors::AskRagError;
use crate::errors::Result;
use crate::models::Metadata;
use crate::models::META_SOURCE;
use crate::vector_store::VectorIndex;

/// Document type recorded in chunk metadata
fn document_type(extension: &str) -> &'static str {
    match extension {
        "md" | "markdown" => "markdown",
        _ => "text",
    }
}

/// Read matching files under `dir` into `(content, metadata)` pairs.
///
/// Unreadable files are logged and skipped.
pub fn load_documents(dir: &Path, extensions: &[String]) -> Result<Vec<(String, Metadata)>> {
    if !dir.is_dir() {
        return Err(AskRagError::NotFound(format!(
            "knowledge base directory {}",
            dir.display()
        )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(extension) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
        else {
            continue;
        };
        if !extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(&extension))
        {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                continue;
            }
        };

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let mut metadata = Metadata::new();
        metadata.insert(
            META_SOURCE.to_string(),
            json!(entry.file_name().to_string_lossy()),
        );
        metadata.insert("path".to_string(), json!(relative.to_string_lossy()));
        metadata.insert("type".to_string(), json!(document_type(&extension)));

        info!("Loaded: {}", relative.display());
        documents.push((content, metadata));
    }

    Ok(documents)
}

/// Ingest every matching file under `dir`, returning the number of chunks added
pub async fn ingest_directory(
    index: &VectorIndex,
    dir: &Path,
    extensions: &[String],
) -> Result<usize> {
    info!("Loading documents from: {}", dir.display());
    let root = dir.to_path_buf();
    let wanted = extensions.to_vec();
    let documents = tokio::task::spawn_blocking(move || load_documents(&root, &wanted))
        .await
        .map_err(|e| AskRagError::Storage(format!("document loading task failed: {e}")))??;
    if documents.is_empty() {
        warn!("No documents found in {}", dir.display());
        return Ok(0);
    }

    let (texts, metadatas): (Vec<String>, Vec<Metadata>) = documents.into_iter().unzip();
    info!("Adding {} documents to vector store", texts.len());
    let ids = index.add_documents(&texts, Some(&metadatas)).await?;

    info!("Successfully added {} document chunks", ids.len());
    Ok(ids.len())
}
