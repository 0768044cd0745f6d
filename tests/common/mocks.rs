//! Mock implementations shared by the integration tests.
//!
//! - [`ScriptedLLMClient`] replays a fixed list of responses and records
//!   every request it receives.
//! - [`FailingVectorStore`] accepts collection setup but fails every read and
//!   write, to exercise the degraded search path.

use async_trait::async_trait;
use course_rag::db::{MetadataFilter, QueryMatch, VectorRecord, VectorStore};
use course_rag::llm::{CompletionRequest, LLMClient, LLMResponse};
use course_rag::llm::generator::AIGenerator;
use course_rag::memory::InMemorySessionStore;
use course_rag::rag::{CourseStore, DocumentProcessor, HashingEmbedder};
use course_rag::db::InMemoryVectorStore;
use course_rag::types::{AppError, Result, ToolCall};
use course_rag::RagSystem;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

pub const MCP_COURSE: &str = "Course Title: Introduction to MCP Servers
Course Link: https://example.com/mcp
Course Instructor: Ada Lovelace

Lesson 0: Welcome
Lesson Link: https://example.com/mcp/0
This course explains the Model Context Protocol. You will build a small server by the end.

Lesson 1: Protocol Basics
Lesson Link: https://example.com/mcp/1
MCP servers expose tools and resources to clients. Messages are exchanged as JSON-RPC.

Lesson 2: Building Tools
Lesson Link: https://example.com/mcp/2
A tool has a name, a description and an input schema. Clients call tools with JSON arguments.
";

pub const CHROMA_COURSE: &str = "Course Title: Advanced Retrieval with Chroma
Course Link: https://example.com/chroma
Course Instructor: Grace Hopper

Lesson 1: Embeddings
Lesson Link: https://example.com/chroma/1
Embeddings map text to vectors. Similar passages end up close together.

Lesson 2: Query Filters
Chroma queries accept metadata filters. Filters narrow results before ranking.
";

// ============= LLM =============

/// LLM client that replays scripted responses in order.
///
/// Once the script runs out it answers with plain text, so a test that
/// under-scripts still terminates.
pub struct ScriptedLLMClient {
    responses: Mutex<VecDeque<Result<LLMResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLLMClient {
    pub fn new(responses: Vec<Result<LLMResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with the same text.
    pub fn answering(text: &str) -> Arc<Self> {
        Self::new(vec![Ok(LLMResponse::text(text))])
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(vec![Err(AppError::LLM(message.to_string()))])
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LLMClient for ScriptedLLMClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(LLMResponse::text("No further answer scripted")))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// A response asking for a single tool call.
pub fn tool_use(id: &str, name: &str, arguments: Value) -> LLMResponse {
    LLMResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: "tool_use".to_string(),
        usage: None,
    }
}

// ============= Vector store =============

/// Vector store whose collections exist but whose every data operation fails.
pub struct FailingVectorStore;

impl FailingVectorStore {
    fn error() -> AppError {
        AppError::Database("connection refused".to_string())
    }
}

#[async_trait]
impl VectorStore for FailingVectorStore {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    async fn ensure_collection(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn delete_collection(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _collection: &str, _records: &[VectorRecord]) -> Result<usize> {
        Err(Self::error())
    }

    async fn query(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _limit: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        Err(Self::error())
    }

    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<QueryMatch>> {
        Err(Self::error())
    }

    async fn get_all(&self, _collection: &str) -> Result<Vec<QueryMatch>> {
        Err(Self::error())
    }

    async fn count(&self, _collection: &str) -> Result<usize> {
        Err(Self::error())
    }
}

// ============= System builders =============

/// A system over the given vector store with default pipeline settings.
pub async fn system_with_store(
    store: Arc<dyn VectorStore>,
    client: Arc<dyn LLMClient>,
) -> RagSystem {
    let course_store = CourseStore::new(store, Arc::new(HashingEmbedder::new(384)), 5)
        .await
        .expect("course store");

    RagSystem::new(
        Arc::new(course_store),
        DocumentProcessor::new(800, 100),
        AIGenerator::new(client, 1),
        Arc::new(InMemorySessionStore::new(2)),
    )
}

/// A system over a fresh in-memory vector store.
pub async fn memory_system(client: Arc<dyn LLMClient>) -> RagSystem {
    system_with_store(Arc::new(InMemoryVectorStore::new()), client).await
}

/// Write both sample courses (plus an unsupported file) into `dir`.
pub fn write_sample_courses(dir: &Path) {
    std::fs::write(dir.join("mcp.txt"), MCP_COURSE).expect("write mcp course");
    std::fs::write(dir.join("chroma.md"), CHROMA_COURSE).expect("write chroma course");
    std::fs::write(dir.join("slides.pdf"), b"%PDF-1.4").expect("write pdf");
}
