use crate::api::handlers::{courses, health, query, sessions};
use crate::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::path::Path;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Routes nested under `/api`
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query))
        .route("/courses", get(courses::course_stats))
        .route("/sessions/{session_id}", delete(sessions::delete_session))
}

/// Full application: API, health, OpenAPI document and optional static frontend
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .nest("/api", create_router())
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(health::openapi));

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa::OpenApi;
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/swagger.json", crate::api::ApiDoc::openapi()),
        );
    }

    if let Some(dir) = state.config.server.frontend_dir.as_deref() {
        if Path::new(dir).is_dir() {
            router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
        } else {
            tracing::warn!(path = %dir, "Frontend directory not found, static files disabled");
        }
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
