pub mod chat;
pub mod documents;
pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, routing::post, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::middleware::request_logger;
use crate::api::state::AppState;

/// Headroom above the file size limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.config.cors.allowed_origins);
    let upload_limit = state.document_service.max_upload_bytes() as usize + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health_check))
        .nest("/api", api_routes(upload_limit))
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Credentials cannot be combined with a wildcard origin.
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins).allow_credentials(true)
    }
}

fn api_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(documents::upload_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/pdf/{file_id}",
            get(documents::get_pdf_info).delete(documents::delete_pdf),
        )
        .route("/pdfs", get(documents::list_pdfs))
        .route("/stats", get(documents::get_stats))
        .route("/chat", post(chat::process_chat))
        .route("/models", get(chat::list_models))
        .route("/ai/status", get(chat::ai_status))
        .route("/health", get(health::health_check))
}
