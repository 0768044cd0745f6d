//! `get_course_outline`: title, link, instructor and lesson list of a course.

use crate::rag::course_store::CourseStore;
use crate::tools::registry::{Tool, ToolOutput};
use crate::types::{AppError, Course, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct CourseOutlineTool {
    store: Arc<CourseStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<CourseStore>) -> Self {
        Self { store }
    }
}

pub fn format_outline(course: &Course) -> String {
    let mut lines = vec![format!("Course: {}", course.title)];
    if let Some(link) = &course.course_link {
        lines.push(format!("Course Link: {}", link));
    }
    if let Some(instructor) = &course.instructor {
        lines.push(format!("Instructor: {}", instructor));
    }
    lines.push(format!("Total Lessons: {}", course.lessons.len()));
    lines.push(String::new());
    lines.push("Lesson Structure:".to_string());

    for lesson in &course.lessons {
        match &lesson.lesson_link {
            Some(link) => lines.push(format!(
                "{}. {} ({})",
                lesson.lesson_number, lesson.title, link
            )),
            None => lines.push(format!("{}. {}", lesson.lesson_number, lesson.title)),
        }
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        "get_course_outline"
    }

    fn description(&self) -> &str {
        "Get the outline of a course: title, course link, instructor and the numbered list of lessons with their links"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "course_name": {
                    "type": "string",
                    "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                }
            },
            "required": ["course_name"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        let course_name = args
            .get("course_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'course_name' parameter".to_string()))?;

        let not_found = || ToolOutput::text(format!("No course found matching '{}'", course_name));

        let Some(title) = self.store.resolve_course_name(course_name).await? else {
            return Ok(not_found());
        };
        match self.store.course(&title).await? {
            Some(course) => Ok(ToolOutput::text(format_outline(&course))),
            None => Ok(not_found()),
        }
    }
}
