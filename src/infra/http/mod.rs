//! axum surface over the application services.

pub mod envelope;
pub mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::{
    application::{
        completions::CompletionService, documents::DocumentService, records::RecordService,
    },
    cache::CacheTierSelector,
};

pub use middleware::{REQUEST_ID_HEADER, RequestContext};

#[derive(Clone)]
pub struct AppState {
    pub records: RecordService,
    pub completions: CompletionService,
    pub documents: DocumentService,
    pub selector: Arc<CacheTierSelector>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/posts", get(handlers::records::list_records))
        .route("/api/posts/{id}", get(handlers::records::get_record))
        .route(
            "/api/posts/user/{user_id}",
            get(handlers::records::records_by_owner),
        )
        .route(
            "/api/posts/document",
            get(handlers::documents::export_document),
        )
        .route(
            "/api/posts/generic/{path}",
            get(handlers::records::generic_resource),
        )
        .route(
            "/api/posts/generic/{path}/query",
            get(handlers::records::generic_query),
        )
        .route(
            "/api/posts/generic/{path}/{id}",
            get(handlers::records::generic_resource_by_id),
        )
        .route("/api/claude/complete", post(handlers::completions::complete))
        .route("/api/claude/chat", post(handlers::completions::chat))
        .route("/api/claude/analyze", post(handlers::completions::analyze))
        .route("/api/claude/generate", post(handlers::completions::generate))
        .route(
            "/api/claude/conversation",
            post(handlers::completions::conversation),
        )
        .route("/api/claude/health", get(handlers::completions::health))
        .route(
            "/api/claude/analysis-types",
            get(handlers::completions::analysis_types),
        )
        .route(
            "/api/claude/content-types",
            get(handlers::completions::content_types),
        )
        .route("/api/cache/tier", get(handlers::cache::tier))
        .route("/api/cache/reprobe", post(handlers::cache::reprobe))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
