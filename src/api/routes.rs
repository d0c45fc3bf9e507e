//! Shared state and router wiring.
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::auth::PinGate;
use crate::backend::InferenceBackend;
use crate::config::Config;
use crate::upload::MAX_UPLOAD_BYTES;

/// Room for multipart boundaries and the `style` field on top of the image.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub struct AppState {
    pub config: Arc<Config>,
    pub gate: PinGate,
    pub backend: Arc<dyn InferenceBackend>,
}

impl AppState {
    pub fn new(config: Arc<Config>, backend: Arc<dyn InferenceBackend>) -> Self {
        AppState { gate: PinGate::new(config.family_pin.clone()), config, backend }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/auth", post(handlers::auth))
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
