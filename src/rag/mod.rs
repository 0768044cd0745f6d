//! Retrieval Augmented Generation (RAG) pipeline for course material
//!
//! # Module Structure
//!
//! - [`rag::document_processor`](crate::rag::document_processor) - Course file parsing
//! - [`rag::chunker`](crate::rag::chunker) - Sentence-aware text chunking
//! - [`rag::embeddings`](crate::rag::embeddings) - Text embedding backends
//! - [`rag::course_store`](crate::rag::course_store) - Course catalog and content collections
//!
//! # Pipeline
//!
//! 1. **Parsing** - A course file yields its metadata, lessons and body text
//! 2. **Chunking** - Lesson bodies are split into overlapping sentence chunks
//! 3. **Storage** - Course metadata goes to the catalog, chunks to the content collection
//! 4. **Retrieval** - Queries are embedded and matched, optionally filtered by course and lesson
//!
//! # Example
//!
//! ```ignore
//! use course_rag::rag::{CourseStore, DocumentProcessor};
//!
//! let processor = DocumentProcessor::new(800, 100);
//! let parsed = processor.process_file(Path::new("docs/course1.txt")).await?;
//!
//! store.add_course_metadata(&parsed.course).await?;
//! store.add_course_content(&parsed.chunks).await?;
//!
//! let results = store.search("what is MCP", Some("MCP"), None, None).await;
//! ```

pub mod chunker;
pub mod course_store;
pub mod document_processor;
pub mod embeddings;

pub use chunker::TextChunker;
pub use course_store::{CourseStore, SearchHit, SearchResults};
pub use document_processor::{DocumentProcessor, ParsedDocument};
pub use embeddings::{create_embedder, Embedder, HashingEmbedder};
#[cfg(feature = "local-embeddings")]
pub use embeddings::FastEmbedder;
