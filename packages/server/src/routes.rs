use crate::handlers::{health, load_content, preview, save_content, validate, AppState};
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/preview", post(preview))
        .route("/api/content", get(load_content).post(save_content))
        .route("/api/validate", post(validate))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Result<Vec<_>, _> = origins.iter().map(|origin| origin.parse()).collect();
    match parsed {
        Ok(parsed) => base.allow_origin(parsed),
        Err(_) => {
            tracing::warn!(?origins, "invalid CORS origins, allowing all");
            base.allow_origin(Any)
        }
    }
}
