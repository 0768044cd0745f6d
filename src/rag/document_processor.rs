//! Course document parsing.
//!
//! Expected layout of a course file:
//!
//! ```text
//! Course Title: Building Towards Computer Use
//! Course Link: https://example.com/course
//! Course Instructor: Jane Doe
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/course/lesson0
//! Lesson text ...
//!
//! Lesson 1: ...
//! ```
//!
//! The header keys are case-insensitive and the link/instructor lines are
//! optional. A file without `Lesson N:` markers is chunked as a whole.

use super::chunker::TextChunker;
use crate::types::{AppError, Course, CourseChunk, Lesson, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^course\s+title:\s*(.*)$").expect("valid title regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^course\s+link:\s*(.+)$").expect("valid link regex"));

static INSTRUCTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^course\s+instructor:\s*(.+)$").expect("valid instructor regex")
});

static LESSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^lesson\s+(\d+):\s*(.*)$").expect("valid lesson regex"));

static LESSON_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^lesson\s+link:\s*(.+)$").expect("valid lesson link regex"));

/// File extensions picked up when ingesting a folder
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// A parsed course document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub course: Course,
    pub chunks: Vec<CourseChunk>,
}

pub struct DocumentProcessor {
    chunker: TextChunker,
}

struct PendingLesson {
    lesson: Lesson,
    lines: Vec<String>,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap),
        }
    }

    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }

    /// Read and parse a course file. Invalid UTF-8 is replaced, not rejected.
    pub async fn process_file(&self, path: &Path) -> Result<ParsedDocument> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let text = String::from_utf8_lossy(&bytes);

        let fallback_title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled course");

        let parsed = self.parse(&text, fallback_title)?;
        debug!(
            path = %path.display(),
            course = %parsed.course.title,
            lessons = parsed.course.lessons.len(),
            chunks = parsed.chunks.len(),
            "Parsed course document"
        );
        Ok(parsed)
    }

    /// Parse course text. `fallback_title` is used when the title line is blank.
    pub fn parse(&self, text: &str, fallback_title: &str) -> Result<ParsedDocument> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        if lines.iter().all(|l| l.trim().is_empty()) {
            return Err(AppError::InvalidInput("Course document is empty".to_string()));
        }

        let first = lines[0].trim();
        let title = match TITLE_RE.captures(first) {
            Some(caps) => caps[1].trim().to_string(),
            None => first.to_string(),
        };
        let title = if title.is_empty() {
            fallback_title.to_string()
        } else {
            title
        };

        // Header lines directly follow the title; the first other line starts the body
        let mut course = Course::new(title);
        let mut body_start = 1;
        for line in lines.iter().take(4).skip(1) {
            let line = line.trim();
            if let Some(caps) = LINK_RE.captures(line) {
                course.course_link = Some(caps[1].trim().to_string());
            } else if let Some(caps) = INSTRUCTOR_RE.captures(line) {
                course.instructor = Some(caps[1].trim().to_string());
            } else {
                break;
            }
            body_start += 1;
        }

        let body = &lines[body_start.min(lines.len())..];
        let chunks = self.parse_body(&mut course, body);

        Ok(ParsedDocument { course, chunks })
    }

    fn parse_body(&self, course: &mut Course, body: &[&str]) -> Vec<CourseChunk> {
        let mut chunks = Vec::new();
        let mut current: Option<PendingLesson> = None;
        let mut preamble: Vec<String> = Vec::new();
        let mut saw_lesson = false;

        let mut i = 0;
        while i < body.len() {
            let line = body[i].trim();

            if let Some((lesson_number, lesson_title)) = lesson_marker(line) {
                if let Some(pending) = current.take() {
                    self.finish_lesson(course, pending, &mut chunks);
                }
                saw_lesson = true;

                let mut lesson = Lesson {
                    lesson_number,
                    title: lesson_title,
                    lesson_link: None,
                };
                if let Some(caps) = body
                    .get(i + 1)
                    .and_then(|next| LESSON_LINK_RE.captures(next.trim()))
                {
                    lesson.lesson_link = Some(caps[1].trim().to_string());
                    i += 1;
                }

                current = Some(PendingLesson {
                    lesson,
                    lines: Vec::new(),
                });
            } else if let Some(pending) = current.as_mut() {
                pending.lines.push(line.to_string());
            } else {
                preamble.push(line.to_string());
            }
            i += 1;
        }

        if let Some(pending) = current.take() {
            self.finish_lesson(course, pending, &mut chunks);
        }

        if !saw_lesson {
            for content in self.chunker.chunk(&preamble.join("\n")) {
                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number: None,
                    chunk_index: chunks.len(),
                });
            }
        }

        chunks
    }

    fn finish_lesson(
        &self,
        course: &mut Course,
        pending: PendingLesson,
        chunks: &mut Vec<CourseChunk>,
    ) {
        let number = pending.lesson.lesson_number;
        for (i, text) in self
            .chunker
            .chunk(&pending.lines.join("\n"))
            .into_iter()
            .enumerate()
        {
            let content = if i == 0 {
                format!("Course {} Lesson {} content: {}", course.title, number, text)
            } else {
                text
            };
            chunks.push(CourseChunk {
                content,
                course_title: course.title.clone(),
                lesson_number: Some(number),
                chunk_index: chunks.len(),
            });
        }
        course.lessons.push(pending.lesson);
    }
}

/// `Lesson N: Title` as `(N, Title)`. A number that does not fit a `u32`
/// leaves the line as ordinary text.
fn lesson_marker(line: &str) -> Option<(u32, String)> {
    let caps = LESSON_RE.captures(line)?;
    match caps[1].parse::<u32>() {
        Ok(number) => Some((number, caps[2].trim().to_string())),
        Err(e) => {
            warn!(line, error = %e, "Lesson number out of range, keeping line as text");
            None
        }
    }
}
