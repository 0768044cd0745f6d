use crate::{types::Result, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::debug;

/// Forget a conversation's history
///
/// Unknown ids are accepted so the call is idempotent.
#[utoipa::path(
    delete,
    path = "/api/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode> {
    let existed = state.system.clear_session(&session_id).await?;
    debug!(session_id = %session_id, existed, "Session cleared");
    Ok(StatusCode::NO_CONTENT)
}
