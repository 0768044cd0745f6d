//! # course-rag
//!
//! A question-answering backend over course material. Course files are parsed
//! into lessons and chunks, embedded into a vector store, and searched by an
//! LLM through tool calling. Answers come back with the course and lesson
//! sources they were grounded on.
//!
//! ## Overview
//!
//! course-rag can be used in two ways:
//!
//! 1. **As a server** - Run the `course-rag` binary
//! 2. **As a library** - Build a [`RagSystem`] and call it directly
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use course_rag::{AppConfig, RagSystem};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load_or_default("course-rag.toml")?;
//!     let system = RagSystem::from_config(&config).await?;
//!
//!     system.add_course_folder(Path::new("docs"), false).await?;
//!
//!     let outcome = system.query(None, "What is covered in lesson 1?").await?;
//!     println!("{}", outcome.answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` (default) | fastembed ONNX embeddings; without it only the lexical hashing embedder is available |
//! | `swagger-ui` | Interactive API docs at `/swagger-ui/` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`db`] - Vector store abstraction (in-memory, ChromaDB)
//! - [`llm`] - Anthropic client and tool-calling answer generation
//! - [`memory`] - Conversation sessions
//! - [`rag`] - Course parsing, chunking, embeddings and search
//! - [`tools`] - Course search and outline tools
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]

/// HTTP API handlers and routes.
pub mod api;
/// Command line interface.
pub mod cli;
/// Vector store clients.
pub mod db;
/// LLM client and answer generation.
pub mod llm;
/// Conversation sessions.
pub mod memory;
/// Course retrieval pipeline.
pub mod rag;
/// The RAG orchestrator.
pub mod system;
/// Tools exposed to the LLM.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration loading.
pub mod utils;

pub use llm::{AIGenerator, AnthropicClient, LLMClient, LLMResponse};
pub use memory::{InMemorySessionStore, SessionStore};
pub use rag::CourseStore;
pub use system::{IngestSummary, QueryOutcome, RagSystem};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::{AppConfig, ConfigError};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The RAG orchestrator
    pub system: Arc<RagSystem>,
    /// Configuration the server was started with
    pub config: Arc<AppConfig>,
}
