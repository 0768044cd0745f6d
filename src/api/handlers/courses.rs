use crate::{
    types::{CourseStats, Result},
    AppState,
};
use axum::{extract::State, Json};

/// Number of loaded courses and their titles
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Course statistics", body = CourseStats),
        (status = 500, description = "Vector store unavailable")
    ),
    tag = "courses"
)]
pub async fn course_stats(State(state): State<AppState>) -> Result<Json<CourseStats>> {
    Ok(Json(state.system.course_analytics().await?))
}
