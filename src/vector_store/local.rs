//! File-backed vector store
//!
//! Each collection lives in `<persist_directory>/<collection>.json`. The file
//! is read on first use and rewritten through a temporary file and a rename
//! after every mutation, so a crash never leaves a half-written collection.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;

use super::l2_distance;
use super::VectorStore;
use crate::errors::AskRagError;
use crate::errors::Result;
use crate::models::RetrievalResult;
use crate::models::StoredChunk;

#[derive(Deserialize)]
struct CollectionFile {
    collection: String,
    chunks: Vec<StoredChunk>,
}

pub struct LocalVectorStore {
    name: String,
    path: PathBuf,
    chunks: RwLock<Option<Vec<StoredChunk>>>,
}

impl LocalVectorStore {
    pub fn new(persist_directory: impl AsRef<Path>, collection: &str) -> Self {
        let path = persist_directory
            .as_ref()
            .join(format!("{}.json", sanitize_file_stem(collection)));
        Self {
            name: collection.to_string(),
            path,
            chunks: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<StoredChunk>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let file: CollectionFile = serde_json::from_slice(&bytes).map_err(|e| {
                    AskRagError::Storage(format!(
                        "corrupt collection file {}: {e}",
                        self.path.display()
                    ))
                })?;
                info!(
                    "Loaded {} chunks for collection '{}'",
                    file.chunks.len(),
                    file.collection
                );
                Ok(file.chunks)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No collection file at {}, starting empty", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(AskRagError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Run `f` over the loaded chunks, loading them first if needed
    async fn with_chunks<T>(&self, f: impl FnOnce(&[StoredChunk]) -> T) -> Result<T> {
        {
            let guard = self.chunks.read().await;
            if let Some(chunks) = guard.as_ref() {
                return Ok(f(chunks));
            }
        }

        let mut guard = self.chunks.write().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(f(guard.as_deref().unwrap_or_default()))
    }

    async fn persist(&self, chunks: &[StoredChunk]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AskRagError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = CollectionFileRef {
            collection: &self.name,
            chunks,
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| {
            AskRagError::Storage(format!("failed to encode collection '{}': {e}", self.name))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(|e| {
            AskRagError::Storage(format!("failed to write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AskRagError::Storage(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CollectionFileRef<'a> {
    collection: &'a str,
    chunks: &'a [StoredChunk],
}

fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, new_chunks: Vec<StoredChunk>) -> Result<()> {
        if new_chunks.is_empty() {
            return Ok(());
        }

        let mut guard = self.chunks.write().await;
        let mut chunks = match guard.take() {
            Some(chunks) => chunks,
            None => self.load().await?,
        };

        let added = new_chunks.len();
        let mut positions: HashMap<String, usize> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (chunk.id.clone(), i))
            .collect();
        for chunk in new_chunks {
            match positions.get(&chunk.id) {
                Some(&i) => chunks[i] = chunk,
                None => {
                    positions.insert(chunk.id.clone(), chunks.len());
                    chunks.push(chunk);
                }
            }
        }

        if let Err(e) = self.persist(&chunks).await {
            // Force a reload so memory never runs ahead of the file
            *guard = None;
            return Err(e);
        }
        *guard = Some(chunks);

        debug!("Upserted {} chunks into '{}'", added, self.name);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        self.with_chunks(|chunks| {
            let mut scored: Vec<(f32, &StoredChunk)> = chunks
                .iter()
                .filter(|chunk| chunk.embedding.len() == embedding.len())
                .map(|chunk| (l2_distance(&chunk.embedding, embedding), chunk))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));

            scored
                .into_iter()
                .take(k)
                .map(|(distance, chunk)| RetrievalResult {
                    text: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    distance,
                })
                .collect()
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.with_chunks(<[StoredChunk]>::len).await
    }

    async fn delete_all(&self) -> Result<()> {
        let mut guard = self.chunks.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AskRagError::Storage(format!(
                    "failed to remove {}: {e}",
                    self.path.display()
                )))
            }
        }
        *guard = Some(Vec::new());
        info!("Deleted all chunks from '{}'", self.name);
        Ok(())
    }
}
