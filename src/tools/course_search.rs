//! `search_course_content`: semantic search over course material.

use crate::rag::course_store::{CourseStore, SearchHit};
use crate::tools::registry::{Tool, ToolOutput};
use crate::types::{AppError, Course, Result, Source};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub struct CourseSearchTool {
    store: Arc<CourseStore>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<CourseStore>) -> Self {
        Self { store }
    }

    /// Catalog entries for the courses in a result set, fetched once each
    async fn courses_for(&self, hits: &[SearchHit]) -> HashMap<String, Course> {
        let mut courses = HashMap::new();
        for title in hits.iter().filter_map(|h| h.course_title.as_deref()) {
            if courses.contains_key(title) {
                continue;
            }
            match self.store.course(title).await {
                Ok(Some(course)) => {
                    courses.insert(title.to_string(), course);
                }
                Ok(None) => {}
                Err(e) => warn!(course = title, error = %e, "Could not load course links"),
            }
        }
        courses
    }

    async fn format_results(&self, hits: &[SearchHit]) -> ToolOutput {
        let courses = self.courses_for(hits).await;
        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());

        for hit in hits {
            let title = hit.course_title.as_deref().unwrap_or("unknown");
            let label = match hit.lesson_number {
                Some(n) => format!("{} - Lesson {}", title, n),
                None => title.to_string(),
            };

            let course = hit.course_title.as_deref().and_then(|t| courses.get(t));
            let link = course.and_then(|c| match hit.lesson_number {
                Some(n) => c.lesson(n).and_then(|l| l.lesson_link.clone()),
                None => c.course_link.clone(),
            });

            blocks.push(format!("[{}]\n{}", label, hit.content));
            sources.push(Source::new(label, link));
        }

        ToolOutput {
            content: blocks.join("\n\n"),
            sources,
        }
    }
}

fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &str {
        "search_course_content"
    }

    fn description(&self) -> &str {
        "Search course materials with smart course name matching and lesson filtering"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for in the course content"
                },
                "course_name": {
                    "type": "string",
                    "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                },
                "lesson_number": {
                    "type": "integer",
                    "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        let course_name = match args.get("course_name") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_str().ok_or_else(|| {
                AppError::InvalidInput("'course_name' must be a string".to_string())
            })?),
        };

        let lesson_number = match args.get("lesson_number") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        AppError::InvalidInput(
                            "'lesson_number' must be a non-negative integer".to_string(),
                        )
                    })?,
            ),
        };

        let results = self
            .store
            .search(query, course_name, lesson_number, None)
            .await;

        if let Some(error) = results.error {
            return Ok(ToolOutput::text(error));
        }
        if results.is_empty() {
            return Ok(ToolOutput::text(no_results_message(course_name, lesson_number)));
        }

        Ok(self.format_results(&results.hits).await)
    }
}
