//! Course-aware view over a vector store.
//!
//! Two collections back it:
//! - `course_catalog`: one record per course, document = title, used to
//!   resolve fuzzy course names and to answer outline questions
//! - `course_content`: one record per chunk, searched semantically
//!
//! Search never returns an `Err`: failures are reported through
//! [`SearchResults::error`] so they can be handed to the LLM as text.

use super::embeddings::Embedder;
use crate::db::vectorstore::{Metadata, MetadataFilter, VectorRecord, VectorStore};
use crate::types::{AppError, Course, CourseChunk, Lesson, Result};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CATALOG_COLLECTION: &str = "course_catalog";
pub const CONTENT_COLLECTION: &str = "course_content";

/// One retrieved chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
    pub distance: f32,
}

/// Ranked hits, or the reason there are none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub error: Option<String>,
}

impl SearchResults {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits, error: None }
    }

    /// No hits, with an explanation
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

pub struct CourseStore {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl CourseStore {
    /// Wrap a vector store, creating both collections if needed.
    pub async fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        max_results: usize,
    ) -> Result<Self> {
        store.ensure_collection(CATALOG_COLLECTION).await?;
        store.ensure_collection(CONTENT_COLLECTION).await?;

        info!(
            provider = store.provider_name(),
            embedder = embedder.name(),
            max_results,
            "Course store ready"
        );

        Ok(Self {
            store,
            embedder,
            max_results,
        })
    }

    /// Upsert the catalog record of a course.
    pub async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let lessons_json = serde_json::to_string(&course.lessons)
            .map_err(|e| AppError::Internal(format!("Failed to encode lessons: {}", e)))?;

        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), json!(course.title));
        if let Some(instructor) = &course.instructor {
            metadata.insert("instructor".to_string(), json!(instructor));
        }
        if let Some(link) = &course.course_link {
            metadata.insert("course_link".to_string(), json!(link));
        }
        metadata.insert("lessons_json".to_string(), json!(lessons_json));
        metadata.insert("lesson_count".to_string(), json!(course.lessons.len()));

        let embedding = self.embedder.embed_one(&course.title)?;
        let record = VectorRecord {
            id: course.title.clone(),
            document: course.title.clone(),
            metadata,
            embedding,
        };

        self.store.upsert(CATALOG_COLLECTION, &[record]).await?;
        debug!(course = %course.title, lessons = course.lessons.len(), "Stored course metadata");
        Ok(())
    }

    /// Upsert content chunks. Every chunk must belong to a catalogued course.
    pub async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let titles: BTreeSet<&str> = chunks.iter().map(|c| c.course_title.as_str()).collect();
        for title in titles {
            if self.store.get(CATALOG_COLLECTION, title).await?.is_none() {
                return Err(AppError::InvalidInput(format!(
                    "Chunks reference unknown course '{}'",
                    title
                )));
            }
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed(&texts)?;

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let mut metadata = Metadata::new();
                metadata.insert("course_title".to_string(), json!(chunk.course_title));
                if let Some(n) = chunk.lesson_number {
                    metadata.insert("lesson_number".to_string(), json!(n));
                }
                metadata.insert("chunk_index".to_string(), json!(chunk.chunk_index));

                VectorRecord {
                    id: format!("{}_{}", chunk.course_title, chunk.chunk_index),
                    document: chunk.content.clone(),
                    metadata,
                    embedding,
                }
            })
            .collect();

        self.store.upsert(CONTENT_COLLECTION, &records).await
    }

    /// Semantic search over course content with optional course and lesson filters.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> SearchResults {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await {
                Ok(Some(title)) => Some(title),
                Ok(None) => return SearchResults::empty(format!("No course found matching '{}'", name)),
                Err(e) => return SearchResults::empty(format!("Search error: {}", e)),
            },
            None => None,
        };

        let mut filters = Vec::new();
        if let Some(title) = &course_title {
            filters.push(MetadataFilter::eq("course_title", title.as_str()));
        }
        if let Some(n) = lesson_number {
            filters.push(MetadataFilter::eq("lesson_number", n));
        }
        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(MetadataFilter::And(filters)),
        };

        let limit = limit.unwrap_or(self.max_results);
        match self.query_content(query, limit, filter.as_ref()).await {
            Ok(hits) => {
                debug!(
                    query,
                    course = ?course_title,
                    lesson = ?lesson_number,
                    hits = hits.len(),
                    "Course content search"
                );
                SearchResults::new(hits)
            }
            Err(e) => {
                warn!(error = %e, "Course content search failed");
                SearchResults::empty(format!("Search error: {}", e))
            }
        }
    }

    async fn query_content(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>> {
        let embedding = self.embedder.embed_one(query)?;
        let matches = self
            .store
            .query(CONTENT_COLLECTION, &embedding, limit, filter)
            .await?;

        Ok(matches
            .into_iter()
            .map(|m| SearchHit {
                course_title: m
                    .metadata
                    .get("course_title")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                lesson_number: m
                    .metadata
                    .get("lesson_number")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok()),
                content: m.document,
                distance: m.distance,
            })
            .collect())
    }

    /// Map a possibly partial course name to the closest catalogued title.
    pub async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed_one(name)?;
        let matches = self
            .store
            .query(CATALOG_COLLECTION, &embedding, 1, None)
            .await?;

        Ok(matches.into_iter().next().map(|m| {
            m.metadata
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(m.id)
        }))
    }

    /// Catalogued course titles, sorted.
    pub async fn existing_course_titles(&self) -> Result<Vec<String>> {
        let mut titles: Vec<String> = self
            .store
            .get_all(CATALOG_COLLECTION)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
        titles.sort();
        Ok(titles)
    }

    pub async fn course_count(&self) -> Result<usize> {
        self.store.count(CATALOG_COLLECTION).await
    }

    /// Full catalog entry for an exact title.
    pub async fn course(&self, title: &str) -> Result<Option<Course>> {
        let Some(record) = self.store.get(CATALOG_COLLECTION, title).await? else {
            return Ok(None);
        };
        let meta = &record.metadata;
        let text = |key: &str| meta.get(key).and_then(Value::as_str).map(str::to_string);

        let lessons: Vec<Lesson> = match meta.get("lessons_json").and_then(Value::as_str) {
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                AppError::Database(format!("Corrupt lesson list for '{}': {}", title, e))
            })?,
            None => Vec::new(),
        };

        Ok(Some(Course {
            title: text("title").unwrap_or(record.id),
            course_link: text("course_link"),
            instructor: text("instructor"),
            lessons,
        }))
    }

    /// Drop and recreate both collections.
    pub async fn clear_all_data(&self) -> Result<()> {
        for collection in [CATALOG_COLLECTION, CONTENT_COLLECTION] {
            self.store.delete_collection(collection).await?;
            self.store.ensure_collection(collection).await?;
        }
        info!("Cleared all course data");
        Ok(())
    }
}
