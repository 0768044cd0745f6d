use crate::{
    types::{QueryRequest, QueryResponse, Result},
    AppState,
};
use axum::{extract::State, Json};
use tracing::info;

/// Answer a question about the course material
#[utoipa::path(
    post,
    path = "/api/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Answer with sources", body = QueryResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Answer generation failed")
    ),
    tag = "query"
)]
pub async fn query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let outcome = state
        .system
        .query(payload.session_id.as_deref(), &payload.query)
        .await?;

    info!(
        session_id = %outcome.session_id,
        sources = outcome.sources.len(),
        "Query answered"
    );

    Ok(Json(QueryResponse {
        answer: outcome.answer,
        sources: outcome.sources,
        session_id: outcome.session_id,
    }))
}
