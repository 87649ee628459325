//! Chunkyard Server Library
//!
//! Chunked file uploads with streaming reassembly and SHA-256 integrity.
//! The server binary is in main.rs; the router is built here so tests can
//! drive it in-process.
//!
//! # Modules
//!
//! - `upload`: identity codec, chunk storage, assembly, metadata, retrieval
//! - `routes`: HTTP handlers
//! - `config`: environment configuration

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod upload;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_chunk_size = state.config().upload.max_chunk_size;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::upload::router())
        .merge(routes::download::router())
        .layer(DefaultBodyLimit::max(max_chunk_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
