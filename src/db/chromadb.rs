//! ChromaDB vector database integration.
//!
//! Talks to a ChromaDB server (1.x) over its v2 REST API. Collections live
//! under a tenant and a database, `default_tenant`/`default_database` unless
//! configured otherwise. Embeddings are computed on our side and sent with
//! every upsert and query, so the server-side embedding function is never
//! used.
//!
//! # Example
//!
//! ```rust,ignore
//! use course_rag::db::chromadb::{ChromaDBStore, DEFAULT_DATABASE, DEFAULT_TENANT};
//!
//! let store = ChromaDBStore::new("http://localhost:8001", DEFAULT_TENANT, DEFAULT_DATABASE).await?;
//! store.ensure_collection("course_content").await?;
//! let matches = store.query("course_content", &embedding, 5, None).await?;
//! ```

use super::vectorstore::{Metadata, MetadataFilter, QueryMatch, VectorRecord, VectorStore};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_TENANT: &str = "default_tenant";
pub const DEFAULT_DATABASE: &str = "default_database";

/// ChromaDB vector store.
pub struct ChromaDBStore {
    client: Client,
    base_url: String,
    tenant: String,
    database: String,
    /// Collection name to server-assigned collection id
    collection_ids: RwLock<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

#[derive(Debug, Default, Deserialize)]
struct GetResponse {
    #[serde(default)]
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Metadata>>>,
}

impl ChromaDBStore {
    /// Create a new ChromaDBStore and check that the server answers.
    pub async fn new(url: &str, tenant: &str, database: &str) -> Result<Self> {
        let store = Self::with_client(Client::new(), url).with_database(tenant, database);
        store.heartbeat().await?;
        Ok(store)
    }

    /// Create a store on the default tenant and database without contacting the server.
    pub fn with_client(client: Client, url: &str) -> Self {
        Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection_ids: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_database(mut self, tenant: &str, database: &str) -> Self {
        self.tenant = tenant.to_string();
        self.database = database.to_string();
        self
    }

    /// `.../collections` endpoint of the configured tenant and database
    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    async fn heartbeat(&self) -> Result<()> {
        let url = format!("{}/api/v2/heartbeat", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::Database(format!("ChromaDB unreachable at {}: {}", self.base_url, e))
        })?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Database(format!(
            "ChromaDB request failed ({}): {}",
            status, body
        )))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("ChromaDB request failed: {}", e)))?;
        Self::check_status(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Database(format!("Invalid ChromaDB response: {}", e)))
    }

    /// Resolve a collection name to its id, caching the answer.
    async fn collection_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.collection_ids.read().get(name) {
            return Ok(id.clone());
        }

        // v2 resolves either a name or an id in this position
        let url = format!("{}/{}", self.collections_url(), name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("ChromaDB request failed: {}", e)))?;
        let collection: CollectionResponse = Self::decode(Self::check_status(response).await?).await?;

        self.collection_ids
            .write()
            .insert(name.to_string(), collection.id.clone());
        Ok(collection.id)
    }

    /// Translate a filter into a Chroma `where` clause.
    fn where_clause(filter: &MetadataFilter) -> Value {
        match filter {
            MetadataFilter::Eq(key, value) => {
                let mut clause = serde_json::Map::new();
                clause.insert(key.clone(), json!({ "$eq": value }));
                Value::Object(clause)
            }
            MetadataFilter::And(filters) => match filters.as_slice() {
                [single] => Self::where_clause(single),
                many => json!({ "$and": many.iter().map(Self::where_clause).collect::<Vec<_>>() }),
            },
        }
    }
}

#[async_trait]
impl VectorStore for ChromaDBStore {
    fn provider_name(&self) -> &'static str {
        "chromadb"
    }

    async fn ensure_collection(&self, name: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "metadata": { "hnsw:space": "cosine" },
            "get_or_create": true,
        });
        let response = self.post_json(&self.collections_url(), &body).await?;
        let collection: CollectionResponse = Self::decode(response).await?;

        debug!(collection = name, id = %collection.id, "ChromaDB collection ready");
        self.collection_ids
            .write()
            .insert(name.to_string(), collection.id);
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collection_ids.write().remove(name);

        let url = format!("{}/{}", self.collections_url(), name);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("ChromaDB request failed: {}", e)))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(collection = name, "Collection did not exist");
                Ok(())
            }
            _ => Self::check_status(response).await.map(|_| ()),
        }
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let id = self.collection_id(collection).await?;
        let body = json!({
            "ids": records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            "embeddings": records.iter().map(|r| &r.embedding).collect::<Vec<_>>(),
            "documents": records.iter().map(|r| r.document.as_str()).collect::<Vec<_>>(),
            "metadatas": records.iter().map(|r| &r.metadata).collect::<Vec<_>>(),
        });
        self.post_json(&format!("{}/{}/upsert", self.collections_url(), id), &body)
            .await?;

        Ok(records.len())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let id = self.collection_id(collection).await?;
        let mut body = json!({
            "query_embeddings": [embedding],
            "n_results": limit,
            "include": ["documents", "metadatas", "distances"],
        });
        if let Some(filter) = filter {
            body["where"] = Self::where_clause(filter);
        }

        let response = self
            .post_json(&format!("{}/{}/query", self.collections_url(), id), &body)
            .await?;
        let result: QueryResponse = Self::decode(response).await?;

        // One query embedding was sent, so only the first row matters
        let ids = result.ids.into_iter().next().unwrap_or_default();
        let documents = result
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let metadatas = result
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default();
        let distances = result
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| QueryMatch {
                id,
                document: documents.get(i).cloned().flatten().unwrap_or_default(),
                metadata: metadatas.get(i).cloned().flatten().unwrap_or_default(),
                distance: distances.get(i).copied().flatten().unwrap_or(0.0),
            })
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<QueryMatch>> {
        let collection_id = self.collection_id(collection).await?;
        let body = json!({
            "ids": [id],
            "include": ["documents", "metadatas"],
        });
        let response = self
            .post_json(&format!("{}/{}/get", self.collections_url(), collection_id), &body)
            .await?;
        let result: GetResponse = Self::decode(response).await?;

        Ok(flatten_get(result).into_iter().next())
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<QueryMatch>> {
        let collection_id = self.collection_id(collection).await?;
        let body = json!({ "include": ["documents", "metadatas"] });
        let response = self
            .post_json(&format!("{}/{}/get", self.collections_url(), collection_id), &body)
            .await?;
        let result: GetResponse = Self::decode(response).await?;

        Ok(flatten_get(result))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let id = self.collection_id(collection).await?;
        let url = format!("{}/{}/count", self.collections_url(), id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("ChromaDB request failed: {}", e)))?;

        Self::decode(Self::check_status(response).await?).await
    }
}

fn flatten_get(result: GetResponse) -> Vec<QueryMatch> {
    let documents = result.documents.unwrap_or_default();
    let metadatas = result.metadatas.unwrap_or_default();

    result
        .ids
        .into_iter()
        .enumerate()
        .map(|(i, id)| QueryMatch {
            id,
            document: documents.get(i).cloned().flatten().unwrap_or_default(),
            metadata: metadatas.get(i).cloned().flatten().unwrap_or_default(),
            distance: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_url_is_scoped_to_database() {
        let store = ChromaDBStore::with_client(Client::new(), "http://chroma:8000/")
            .with_database("acme", "courses");
        assert_eq!(
            store.collections_url(),
            "http://chroma:8000/api/v2/tenants/acme/databases/courses/collections"
        );
    }

    #[test]
    fn test_where_clause_single() {
        let clause = ChromaDBStore::where_clause(&MetadataFilter::eq("course_title", "A"));
        assert_eq!(clause, json!({"course_title": {"$eq": "A"}}));
    }

    #[test]
    fn test_where_clause_conjunction() {
        let filter = MetadataFilter::And(vec![
            MetadataFilter::eq("course_title", "A"),
            MetadataFilter::eq("lesson_number", 3),
        ]);
        assert_eq!(
            ChromaDBStore::where_clause(&filter),
            json!({"$and": [
                {"course_title": {"$eq": "A"}},
                {"lesson_number": {"$eq": 3}}
            ]})
        );
    }

    #[test]
    fn test_where_clause_and_of_one_is_unwrapped() {
        let filter = MetadataFilter::And(vec![MetadataFilter::eq("lesson_number", 1)]);
        assert_eq!(
            ChromaDBStore::where_clause(&filter),
            json!({"lesson_number": {"$eq": 1}})
        );
    }

    #[test]
    fn test_query_response_tolerates_nulls() {
        let raw = json!({
            "ids": [["x_0", "x_1"]],
            "documents": [["first", null]],
            "metadatas": null,
            "distances": [[0.1, 0.4]]
        });
        let parsed: QueryResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.ids[0].len(), 2);
        assert!(parsed.metadatas.is_none());
        assert_eq!(parsed.documents.unwrap()[0][1], None);
    }

    #[test]
    fn test_flatten_get_fills_missing_fields() {
        let result = GetResponse {
            ids: vec!["a".to_string(), "b".to_string()],
            documents: Some(vec![Some("doc a".to_string())]),
            metadatas: None,
        };
        let matches = flatten_get(result);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].document, "doc a");
        assert_eq!(matches[1].document, "");
        assert!(matches[1].metadata.is_empty());
    }
}
