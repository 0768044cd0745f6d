//! Vector stores.
//!
//! Two backends implement [`VectorStore`]:
//! - `InMemoryVectorStore` (default) - embedded, nothing persisted
//! - `ChromaDBStore` - a ChromaDB server reached over its v2 REST API
//!
//! Pick one in `course-rag.toml`:
//! ```toml
//! [vector_store]
//! provider = "chromadb"
//! url = "http://localhost:8001"
//! tenant = "default_tenant"
//! database = "default_database"
//! ```

// Vector store abstraction layer
pub mod vectorstore;

// Provider implementations
pub mod chromadb;

// Re-exports
pub use chromadb::ChromaDBStore;
pub use vectorstore::{
    InMemoryVectorStore, Metadata, MetadataFilter, QueryMatch, VectorRecord, VectorStore,
    VectorStoreProvider,
};
