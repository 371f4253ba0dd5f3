//! RAG (Retrieval-Augmented Generation) module
//!
//! End-to-end question answering over the ingested knowledge base:
//! - Semantic retrieval through the vector index
//! - Context assembly and grounded answer generation
//! - Heuristic confidence scoring
//! - Short-lived conversation history
//!
//! # Examples
//!
//! ```rust,no_run
//! use askrag::config::AppConfig;
//! use askrag::models::ChatRequest;
//! use askrag::rag::ChatService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = ChatService::from_config(&config).await?;
//!
//!     let response = service
//!         .ask_question(ChatRequest::new("What languages does Ashish use?"))
//!         .await?;
//!     println!("Answer: {}", response.answer);
//!     println!("Sources: {} chunks", response.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod confidence;
pub mod conversation;
pub mod generator;
pub mod ingest;
pub mod pipeline;

pub use confidence::estimate_confidence;
pub use conversation::ConversationManager;
pub use generator::AnswerGenerator;
pub use generator::GenerationMetadata;
pub use ingest::ingest_directory;
pub use pipeline::AnswerStream;
pub use pipeline::ChatService;
pub use pipeline::ChatSettings;
pub use pipeline::StreamEvent;
