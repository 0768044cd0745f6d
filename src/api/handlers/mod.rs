//! API request handlers.

/// Course catalog statistics.
pub mod courses;
/// Liveness and OpenAPI document.
pub mod health;
/// Question answering.
pub mod query;
/// Session management.
pub mod sessions;
