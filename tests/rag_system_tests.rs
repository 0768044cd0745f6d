//! End-to-end tests of the RAG orchestrator over the in-memory vector store
//! with a scripted LLM.

mod common;

use common::mocks::{
    memory_system, system_with_store, tool_use, write_sample_courses, FailingVectorStore,
    ScriptedLLMClient, CHROMA_COURSE, MCP_COURSE,
};
use course_rag::llm::{ContentBlock, LLMResponse};
use course_rag::types::{AppError, Source};
use course_rag::SessionStore;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const MCP_TITLE: &str = "Introduction to MCP Servers";
const CHROMA_TITLE: &str = "Advanced Retrieval with Chroma";

fn tool_result(block: &ContentBlock) -> (&str, bool) {
    match block {
        ContentBlock::ToolResult {
            content, is_error, ..
        } => (content.as_str(), *is_error),
        other => panic!("expected tool result, got {:?}", other),
    }
}

// ============= Ingestion =============

#[tokio::test]
async fn test_add_course_folder_loads_supported_files() {
    let dir = TempDir::new().unwrap();
    write_sample_courses(dir.path());
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;

    let summary = system.add_course_folder(dir.path(), false).await.unwrap();

    assert_eq!(summary.courses, 2);
    assert_eq!(summary.chunks, 5);

    let stats = system.course_analytics().await.unwrap();
    assert_eq!(stats.total_courses, 2);
    assert_eq!(stats.course_titles, vec![CHROMA_TITLE, MCP_TITLE]);
}

#[tokio::test]
async fn test_add_course_folder_skips_known_titles() {
    let dir = TempDir::new().unwrap();
    write_sample_courses(dir.path());
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;

    system.add_course_folder(dir.path(), false).await.unwrap();
    let again = system.add_course_folder(dir.path(), false).await.unwrap();

    assert_eq!(again.courses, 0);
    assert_eq!(again.chunks, 0);
    assert_eq!(system.course_analytics().await.unwrap().total_courses, 2);
}

#[tokio::test]
async fn test_add_course_folder_with_clear_reloads() {
    let dir = TempDir::new().unwrap();
    write_sample_courses(dir.path());
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;

    system.add_course_folder(dir.path(), false).await.unwrap();
    let reloaded = system.add_course_folder(dir.path(), true).await.unwrap();

    assert_eq!(reloaded.courses, 2);
    assert_eq!(system.course_analytics().await.unwrap().total_courses, 2);
}

#[tokio::test]
async fn test_add_course_folder_missing_directory() {
    let dir = TempDir::new().unwrap();
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;

    let summary = system
        .add_course_folder(&dir.path().join("does-not-exist"), false)
        .await
        .unwrap();

    assert_eq!(summary.courses, 0);
    assert_eq!(system.course_analytics().await.unwrap().total_courses, 0);
}

#[tokio::test]
async fn test_add_course_folder_skips_empty_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("empty.txt"), "").unwrap();
    std::fs::write(dir.path().join("mcp.txt"), MCP_COURSE).unwrap();
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;

    let summary = system.add_course_folder(dir.path(), false).await.unwrap();

    assert_eq!(summary.courses, 1);
}

#[tokio::test]
async fn test_add_course_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chroma.txt");
    std::fs::write(&path, CHROMA_COURSE).unwrap();
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;

    let (course, chunks) = system.add_course_document(&path).await.unwrap();

    assert_eq!(course.title, CHROMA_TITLE);
    assert_eq!(course.instructor.as_deref(), Some("Grace Hopper"));
    assert_eq!(course.lessons.len(), 2);
    assert_eq!(chunks, 2);
}

// ============= Retrieval =============

#[tokio::test]
async fn test_ingested_title_is_retrievable() {
    let dir = TempDir::new().unwrap();
    write_sample_courses(dir.path());
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;
    system.add_course_folder(dir.path(), false).await.unwrap();

    let results = system
        .course_store()
        .search(MCP_TITLE, None, None, None)
        .await;

    assert!(results.error.is_none());
    assert!(results
        .hits
        .iter()
        .any(|h| h.course_title.as_deref() == Some(MCP_TITLE)));
}

#[tokio::test]
async fn test_search_filters_by_course_and_lesson() {
    let dir = TempDir::new().unwrap();
    write_sample_courses(dir.path());
    let system = memory_system(ScriptedLLMClient::answering("unused")).await;
    system.add_course_folder(dir.path(), false).await.unwrap();

    let results = system
        .course_store()
        .search("tools and vectors", Some(CHROMA_TITLE), Some(1), None)
        .await;

    assert!(!results.is_empty());
    for hit in &results.hits {
        assert_eq!(hit.course_title.as_deref(), Some(CHROMA_TITLE));
        assert_eq!(hit.lesson_number, Some(1));
    }
}

// ============= Queries =============

#[tokio::test]
async fn test_query_without_session_uses_search_tool() {
    let dir = TempDir::new().unwrap();
    write_sample_courses(dir.path());
    let client = ScriptedLLMClient::new(vec![
        Ok(tool_use(
            "toolu_1",
            "search_course_content",
            json!({
                "query": "What is lesson 2 about?",
                "course_name": "Introduction to MCP",
                "lesson_number": 2
            }),
        )),
        Ok(LLMResponse::text("Lesson 2 covers building tools.")),
    ]);
    let system = memory_system(client.clone()).await;
    system.add_course_folder(dir.path(), false).await.unwrap();

    let outcome = system.query(None, "What is lesson 2 about?").await.unwrap();

    assert_eq!(outcome.answer, "Lesson 2 covers building tools.");
    assert!(!outcome.session_id.is_empty());
    assert_eq!(
        outcome.sources,
        vec![Source::new(
            "Introduction to MCP Servers - Lesson 2",
            Some("https://example.com/mcp/2".to_string())
        )]
    );

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].messages[0].text(),
        "Answer this question about course materials: What is lesson 2 about?"
    );
    assert!(!requests[0].tools.is_empty());
    // The follow-up call offers no tools, so there is no nested tool use
    assert!(requests[1].tools.is_empty());

    let (content, is_error) = tool_result(&requests[1].messages[2].content[0]);
    assert!(!is_error);
    assert!(content.starts_with("[Introduction to MCP Servers - Lesson 2]"));
    assert!(content.contains("input schema"));
}

#[tokio::test]
async fn test_query_records_history_for_session() {
    let client = ScriptedLLMClient::new(vec![
        Ok(LLMResponse::text("First answer")),
        Ok(LLMResponse::text("Second answer")),
    ]);
    let system = memory_system(client.clone()).await;

    let first = system.query(None, "First question").await.unwrap();
    let second = system
        .query(Some(&first.session_id), "Second question")
        .await
        .unwrap();

    assert_eq!(first.session_id, second.session_id);
    let requests = client.requests();
    assert!(!requests[0].system.contains("Previous conversation"));
    assert!(requests[1]
        .system
        .ends_with("Previous conversation:\nUser: First question\nAssistant: First answer"));
}

#[tokio::test]
async fn test_query_adopts_unknown_session_id() {
    let system = memory_system(ScriptedLLMClient::answering("Hi")).await;

    let outcome = system.query(Some("my-session"), "Hello").await.unwrap();

    assert_eq!(outcome.session_id, "my-session");
    let history = system.sessions().history("my-session").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].query, "Hello");
}

#[tokio::test]
async fn test_outline_tool_through_query() {
    let dir = TempDir::new().unwrap();
    write_sample_courses(dir.path());
    let client = ScriptedLLMClient::new(vec![
        Ok(tool_use(
            "toolu_1",
            "get_course_outline",
            json!({"course_name": "Chroma retrieval"}),
        )),
        Ok(LLMResponse::text("Two lessons.")),
    ]);
    let system = memory_system(client.clone()).await;
    system.add_course_folder(dir.path(), false).await.unwrap();

    let outcome = system.query(None, "Outline of the Chroma course?").await.unwrap();

    assert_eq!(outcome.answer, "Two lessons.");
    let requests = client.requests();
    let (content, _) = tool_result(&requests[1].messages[2].content[0]);
    assert!(content.contains("Course: Advanced Retrieval with Chroma"));
    assert!(content.contains("Instructor: Grace Hopper"));
    assert!(content.contains("1. Embeddings"));
    assert!(content.contains("2. Query Filters"));
}

#[tokio::test]
async fn test_query_llm_failure_propagates() {
    let system = memory_system(ScriptedLLMClient::failing("overloaded")).await;

    let result = system.query(Some("s1"), "Anything").await;

    assert!(matches!(result, Err(AppError::LLM(_))));
    assert!(system.sessions().history("s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_vector_store_failure_still_answers() {
    let client = ScriptedLLMClient::new(vec![
        Ok(tool_use(
            "toolu_1",
            "search_course_content",
            json!({"query": "embeddings"}),
        )),
        Ok(LLMResponse::text("I could not search the material right now.")),
    ]);
    let system = system_with_store(Arc::new(FailingVectorStore), client.clone()).await;

    let outcome = system.query(None, "Explain embeddings").await.unwrap();

    assert_eq!(outcome.answer, "I could not search the material right now.");
    assert!(outcome.sources.is_empty());

    let requests = client.requests();
    let (content, _) = tool_result(&requests[1].messages[2].content[0]);
    assert!(content.starts_with("Search error:"));
}

#[tokio::test]
async fn test_clear_session() {
    let system = memory_system(ScriptedLLMClient::answering("ok")).await;
    let outcome = system.query(None, "q").await.unwrap();

    assert!(system.clear_session(&outcome.session_id).await.unwrap());
    assert!(!system.clear_session(&outcome.session_id).await.unwrap());
}
