//! HTTP API for the note editor: user-scoped note CRUD plus a proxy
//! to the vision analysis service.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod store;

use crate::store::NoteStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NoteStore>,
    pub http: reqwest::Client,
    pub analyze_upstream: String,
    pub api_key: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route(
            "/api/notes",
            get(handlers::list_notes).post(handlers::create_note),
        )
        .route(
            "/api/notes/:id",
            get(handlers::get_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
        .route("/analyze", post(handlers::analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
