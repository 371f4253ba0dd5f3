//! CLI command handlers module
//!
//! - serve: API server
//! - ingest: knowledge base ingestion
//! - ask: single questions and interactive chat
//! - info: statistics, reset and config display

pub mod ask;
pub mod info;
pub mod ingest;
pub mod serve;

pub use ask::*;
pub use info::*;
pub use ingest::*;
pub use serve::*;
