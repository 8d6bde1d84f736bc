pub mod config;
pub mod error;
pub mod filters;
pub mod gemini;
pub mod indexer;
pub mod logging;
pub mod models;
pub mod rag;
pub mod server;
