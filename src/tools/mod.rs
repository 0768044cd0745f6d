//! Tools the model can call while answering.
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - `Tool` trait, registration and dispatch
//! - [`course_search`](crate::tools::course_search) - `search_course_content`
//! - [`course_outline`](crate::tools::course_outline) - `get_course_outline`
//!
//! # Tool Registry
//!
//! ```ignore
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(CourseSearchTool::new(store.clone())));
//! let definitions = registry.get_tool_definitions();
//! let outcome = registry.run("search_course_content", json!({"query": "MCP"})).await;
//! ```
//!
//! Each execution returns its own sources, so concurrent requests never see
//! each other's results.

/// Course outline tool.
pub mod course_outline;
/// Course content search tool.
pub mod course_search;
/// Tool registry for managing available tools.
pub mod registry;

pub use course_outline::CourseOutlineTool;
pub use course_search::CourseSearchTool;
pub use registry::{Tool, ToolOutcome, ToolOutput, ToolRegistry};
