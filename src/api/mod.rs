//! HTTP API serving the question-answering service under `/api/v1`

pub mod auth;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod types;

pub use server::build_router;
pub use server::serve_api;
