//! Vector Store Abstraction Layer
//!
//! A unified interface over the vector database backends the course store can
//! run on. Records are grouped into named collections; each record carries its
//! document text, a flat JSON metadata map and an embedding.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     VectorStore Trait                     │
//! ├──────────────────────────────────────────────────────────┤
//! │ ensure_collection │ upsert │ query │ get │ count │ ...   │
//! └──────────────────────────────────────────────────────────┘
//!              ▲                              ▲
//!        ┌─────┴──────┐               ┌───────┴──────┐
//!        │  InMemory  │               │   ChromaDB   │
//!        │ (default)  │               │  (REST API)  │
//!        └────────────┘               └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use course_rag::db::vectorstore::{VectorStore, VectorStoreProvider};
//!
//! let store = VectorStoreProvider::InMemory.create_store().await?;
//! store.ensure_collection("course_content").await?;
//! store.upsert("course_content", &records).await?;
//! let matches = store.query("course_content", &embedding, 5, None).await?;
//! ```

use crate::types::{AppError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Flat metadata attached to every record
pub type Metadata = Map<String, Value>;

// ============================================================================
// Vector Store Provider Configuration
// ============================================================================

/// Configuration for vector store providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// ChromaDB server reached over its v2 REST API.
    ChromaDB {
        /// ChromaDB server URL (e.g., "http://localhost:8001").
        url: String,
        tenant: String,
        database: String,
    },

    /// In-memory vector store.
    ///
    /// Data is not persisted and will be lost when the process exits.
    InMemory,
}

impl VectorStoreProvider {
    /// Create a vector store instance from this provider configuration.
    pub async fn create_store(&self) -> Result<Arc<dyn VectorStore>> {
        match self {
            VectorStoreProvider::ChromaDB {
                url,
                tenant,
                database,
            } => {
                let store = super::chromadb::ChromaDBStore::new(url, tenant, database).await?;
                Ok(Arc::new(store))
            }
            VectorStoreProvider::InMemory => Ok(Arc::new(InMemoryVectorStore::new())),
        }
    }
}

// ============================================================================
// Records, matches and filters
// ============================================================================

/// A record stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// A record returned by a query or get, without its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// Distance to the query vector; lower is closer. `0.0` for `get`.
    pub distance: f32,
}

/// Metadata filter applied to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataFilter {
    /// Metadata key equals the value
    Eq(String, Value),
    /// All filters must match
    And(Vec<MetadataFilter>),
}

impl MetadataFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        MetadataFilter::Eq(key.into(), value.into())
    }

    /// Whether a record's metadata satisfies this filter
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            MetadataFilter::Eq(key, value) => metadata.get(key) == Some(value),
            MetadataFilter::And(filters) => filters.iter().all(|f| f.matches(metadata)),
        }
    }
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Abstract trait for vector database operations.
///
/// # Implementors
///
/// - `InMemoryVectorStore` - embedded, default
/// - `ChromaDBStore` - ChromaDB server
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create the collection if it does not exist yet.
    async fn ensure_collection(&self, name: &str) -> Result<()>;

    /// Delete a collection and all its data. Deleting a missing collection is not an error.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or replace records by id.
    ///
    /// # Returns
    ///
    /// Number of records written.
    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize>;

    /// Nearest-neighbour query.
    ///
    /// # Returns
    ///
    /// At most `limit` matches, sorted by distance (ascending).
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>>;

    /// Get a record by ID.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<QueryMatch>>;

    /// All records of a collection, in no particular order.
    async fn get_all(&self, collection: &str) -> Result<Vec<QueryMatch>>;

    /// Count records in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

// ============================================================================
// In-Memory Vector Store
// ============================================================================

/// In-memory vector store.
///
/// Uses cosine distance (`1 - cosine similarity`) for comparisons.
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, HashMap<String, VectorRecord>>>>,
}

impl InMemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Calculate cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    fn to_match(record: &VectorRecord, distance: f32) -> QueryMatch {
        QueryMatch {
            id: record.id.clone(),
            document: record.document.clone(),
            metadata: record.metadata.clone(),
            distance,
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn collection_not_found(name: &str) -> AppError {
    AppError::NotFound(format!("Collection '{}' not found", name))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn ensure_collection(&self, name: &str) -> Result<()> {
        self.collections
            .write()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        for record in records {
            col.insert(record.id.clone(), record.clone());
        }

        Ok(records.len())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        let mut results: Vec<QueryMatch> = col
            .values()
            .filter(|record| filter.is_none_or(|f| f.matches(&record.metadata)))
            .map(|record| {
                let distance = 1.0 - Self::cosine_similarity(embedding, &record.embedding);
                Self::to_match(record, distance)
            })
            .collect();

        // Ties broken by id so results are deterministic
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<QueryMatch>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        Ok(col.get(id).map(|record| Self::to_match(record, 0.0)))
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<QueryMatch>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        Ok(col.values().map(|record| Self::to_match(record, 0.0)).collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read();
        Ok(collections.get(collection).map_or(0, HashMap::len))
    }
}

// ============================================================================
// Tests
// ============================================================================
