//! HTTP API handlers and routes
//!
//! Built on axum. Every handler talks to the shared [`RagSystem`](crate::system::RagSystem)
//! through [`AppState`](crate::AppState).
//!
//! # API Endpoints
//!
//! - `POST /api/query` - Ask a question about the course material
//! - `GET /api/courses` - Course count and titles
//! - `DELETE /api/sessions/{session_id}` - Forget a conversation
//! - `GET /health` - Health check
//! - `GET /api-docs/openapi.json` - OpenAPI document
//!
//! When `server.frontend_dir` is set, any other path is served from that
//! directory. With the `swagger-ui` feature enabled, interactive API
//! documentation is available at `/swagger-ui/`.

/// Request handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{CourseStats, QueryRequest, QueryResponse, Source};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::query::query,
        handlers::courses::course_stats,
        handlers::sessions::delete_session,
        handlers::health::health,
    ),
    components(schemas(QueryRequest, QueryResponse, CourseStats, Source)),
    tags(
        (name = "query", description = "Course question answering"),
        (name = "courses", description = "Course catalog"),
        (name = "sessions", description = "Conversation sessions"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
