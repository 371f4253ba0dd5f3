#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use askrag::chunking::TextChunker;
use askrag::embeddings::EmbeddingBackend;
use askrag::embeddings::EmbeddingConfig;
use askrag::embeddings::EmbeddingService;
use askrag::embeddings::RetryPolicy;
use askrag::llm::Completion;
use askrag::llm::LanguageModel;
use askrag::llm::StreamingResponse;
use askrag::models::ChatMessage;
use askrag::rag::AnswerGenerator;
use askrag::rag::ChatService;
use askrag::rag::ChatSettings;
use askrag::vector_store::LocalVectorStore;
use askrag::vector_store::VectorIndex;
use askrag::AskRagError;
use askrag::Result;
use async_trait::async_trait;

pub const DIM: usize = 64;
pub const ANSWER: &str = "Ashish works with Rust and Python.";
pub const FRAGMENTS: [&str; 3] = ["Ashish works ", "with Rust ", "and Python."];

/// Deterministic bag-of-words embedding: each word is hashed into a bucket
pub struct HashedBagOfWords {
    pub texts_embedded: AtomicUsize,
}

impl HashedBagOfWords {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            texts_embedded: AtomicUsize::new(0),
        })
    }

    pub fn embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in word.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            v[(hash % DIM as u64) as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl EmbeddingBackend for HashedBagOfWords {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.texts_embedded.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Language model returning canned text and recording every prompt
pub struct ScriptedModel {
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
    fragments: Vec<String>,
    cut_short: bool,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Self::streaming(FRAGMENTS.iter().map(|f| (*f).to_string()).collect(), false)
    }

    /// Streams `fragments`, then fails instead of finishing when `cut_short` is set
    pub fn streaming(fragments: Vec<String>, cut_short: bool) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            fragments,
            cut_short,
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok(Completion {
            text: ANSWER.to_string(),
            total_tokens: Some(42),
        })
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<StreamingResponse> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let mut items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        if self.cut_short {
            items.push(Err(AskRagError::GenerationService(
                "stream ended before [DONE]".to_string(),
            )));
        }
        Ok(StreamingResponse::new(Box::pin(futures::stream::iter(items))))
    }
}

pub struct Harness {
    pub service: Arc<ChatService>,
    pub model: Arc<ScriptedModel>,
    pub embedder: Arc<HashedBagOfWords>,
}

pub fn harness(store_dir: &Path, settings: ChatSettings) -> Harness {
    harness_with_model(store_dir, settings, ScriptedModel::new())
}

pub fn harness_with_model(
    store_dir: &Path,
    settings: ChatSettings,
    model: Arc<ScriptedModel>,
) -> Harness {
    let embedder = HashedBagOfWords::new();

    let config = EmbeddingConfig {
        dimension: DIM,
        retry: RetryPolicy::no_retry(),
        ..EmbeddingConfig::default()
    };
    let embeddings = Arc::new(EmbeddingService::with_backend(embedder.clone(), config));
    let store = Arc::new(LocalVectorStore::new(store_dir, "test_collection"));
    let index = Arc::new(VectorIndex::new(
        store,
        embeddings,
        TextChunker::new(200, 40),
    ));
    let generator = AnswerGenerator::new(model.clone(), &settings.subject, settings.include_history);

    Harness {
        service: Arc::new(ChatService::new(index, generator, settings)),
        model,
        embedder,
    }
}

/// Write a small knowledge base into `dir`
pub fn write_knowledge_base(dir: &Path) {
    std::fs::create_dir_all(dir.join("projects")).unwrap();
    std::fs::write(
        dir.join("about.md"),
        "# About\n\nAshish is a backend engineer based in Bangalore. \
         He enjoys building distributed systems and developer tooling.",
    )
    .unwrap();
    std::fs::write(
        dir.join("skills.txt"),
        "Programming languages: Ashish writes Rust and Python every day. \
         He also knows Go and TypeScript.",
    )
    .unwrap();
    std::fs::write(
        dir.join("projects").join("search.md"),
        "Ashish built a semantic search service using embeddings and Postgres.",
    )
    .unwrap();
    std::fs::write(dir.join("notes.rs"), "fn main() {}").unwrap();
}

pub fn extensions() -> Vec<String> {
    vec!["md".to_string(), "txt".to_string()]
}
