//! askrag: retrieval-augmented question answering over a personal knowledge base
//!
//! Documents are chunked, embedded and stored in a vector collection. Questions
//! are answered by retrieving the closest chunks and asking a language model to
//! answer from that context only.

pub mod api;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod models_tests;

pub use config::AppConfig;
pub use errors::*;
