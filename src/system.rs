//! The RAG orchestrator.
//!
//! [`RagSystem`] owns every long-lived component: course store, tool
//! registry, answer generator and session store. Handlers and the CLI only
//! talk to it.

use crate::db::vectorstore::VectorStoreProvider;
use crate::llm::anthropic::AnthropicClient;
use crate::llm::client::{LLMClient, ModelParams};
use crate::llm::generator::AIGenerator;
use crate::memory::{InMemorySessionStore, SessionStore};
use crate::rag::course_store::CourseStore;
use crate::rag::document_processor::DocumentProcessor;
use crate::rag::embeddings::create_embedder;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolRegistry};
use crate::types::{AppError, Course, CourseStats, Result, Source};
use crate::utils::toml_config::{AppConfig, VectorStoreKind};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix put in front of every user question
const QUERY_PROMPT: &str = "Answer this question about course materials: ";

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
}

/// What a folder ingestion added
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub courses: usize,
    pub chunks: usize,
}

pub struct RagSystem {
    store: Arc<CourseStore>,
    processor: DocumentProcessor,
    tools: ToolRegistry,
    generator: AIGenerator,
    sessions: Arc<dyn SessionStore>,
}

impl RagSystem {
    /// Assemble a system from ready-made parts and register the course tools.
    pub fn new(
        store: Arc<CourseStore>,
        processor: DocumentProcessor,
        generator: AIGenerator,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CourseSearchTool::new(store.clone())));
        tools.register(Arc::new(CourseOutlineTool::new(store.clone())));

        Self {
            store,
            processor,
            tools,
            generator,
            sessions,
        }
    }

    /// Build the course store from configuration, with a caller-supplied LLM client.
    pub async fn with_client(config: &AppConfig, client: Arc<dyn LLMClient>) -> Result<Self> {
        let embedder = create_embedder(&config.rag)?;
        let provider = match config.vector_store.provider {
            VectorStoreKind::Memory => VectorStoreProvider::InMemory,
            VectorStoreKind::Chromadb => VectorStoreProvider::ChromaDB {
                url: config.vector_store.url.clone(),
                tenant: config.vector_store.tenant.clone(),
                database: config.vector_store.database.clone(),
            },
        };
        let vector_store = provider.create_store().await?;
        let store = Arc::new(CourseStore::new(vector_store, embedder, config.rag.max_results).await?);

        Ok(Self::new(
            store,
            DocumentProcessor::new(config.rag.chunk_size, config.rag.chunk_overlap),
            AIGenerator::new(client, config.llm.max_tool_rounds),
            Arc::new(InMemorySessionStore::new(config.rag.max_history)),
        ))
    }

    /// Build everything from configuration, talking to Anthropic.
    ///
    /// A missing API key is only a warning: ingestion works without one and
    /// queries fail with the provider's authentication error.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.api_key().unwrap_or_else(|e| {
            warn!(error = %e, "No LLM API key configured");
            String::new()
        });
        let client = AnthropicClient::with_params(
            api_key,
            config.llm.model.clone(),
            ModelParams {
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            },
        )
        .with_base_url(config.llm.base_url.clone());

        Self::with_client(config, Arc::new(client)).await
    }

    pub fn course_store(&self) -> &Arc<CourseStore> {
        &self.store
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Answer a question within a session.
    ///
    /// Without a session id a new session is created. An id the store has
    /// never seen is adopted as-is.
    pub async fn query(&self, session_id: Option<&str>, text: &str) -> Result<QueryOutcome> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session().await?,
        };

        let history = self.sessions.format_history(&session_id).await?;
        let prompt = format!("{}{}", QUERY_PROMPT, text);

        let generated = self
            .generator
            .generate(&prompt, history.as_deref(), &self.tools)
            .await?;

        self.sessions
            .add_exchange(&session_id, text, &generated.answer)
            .await?;

        Ok(QueryOutcome {
            answer: generated.answer,
            sources: generated.sources,
            session_id,
        })
    }

    /// Parse one course file and store its metadata and chunks.
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let parsed = self.processor.process_file(path).await?;
        self.store.add_course_metadata(&parsed.course).await?;
        let chunks = self.store.add_course_content(&parsed.chunks).await?;

        info!(course = %parsed.course.title, chunks, "Added course document");
        Ok((parsed.course, chunks))
    }

    /// Ingest every `.txt`/`.md` file in a folder, skipping courses already stored.
    pub async fn add_course_folder(&self, folder: &Path, clear_existing: bool) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();

        if clear_existing {
            self.store.clear_all_data().await?;
        }

        if !folder.is_dir() {
            warn!(path = %folder.display(), "Course folder does not exist");
            return Ok(summary);
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(folder).await.map_err(|e| {
            AppError::Internal(format!("Failed to read {}: {}", folder.display(), e))
        })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read {}: {}", folder.display(), e)))?
        {
            let path = entry.path();
            if path.is_file() && DocumentProcessor::is_supported(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut known: HashSet<String> = self.store.existing_course_titles().await?.into_iter().collect();

        for path in paths {
            let parsed = match self.processor.process_file(&path).await {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable course file");
                    continue;
                }
            };

            if known.contains(&parsed.course.title) {
                debug!(course = %parsed.course.title, "Course already loaded, skipping");
                continue;
            }

            self.store.add_course_metadata(&parsed.course).await?;
            summary.chunks += self.store.add_course_content(&parsed.chunks).await?;
            summary.courses += 1;
            known.insert(parsed.course.title);
        }

        info!(
            path = %folder.display(),
            courses = summary.courses,
            chunks = summary.chunks,
            "Course folder ingested"
        );
        Ok(summary)
    }

    pub async fn course_analytics(&self) -> Result<CourseStats> {
        let course_titles = self.store.existing_course_titles().await?;
        Ok(CourseStats {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    pub async fn clear_session(&self, session_id: &str) -> Result<bool> {
        self.sessions.clear_session(session_id).await
    }
}
