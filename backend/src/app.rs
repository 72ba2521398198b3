use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
};

use crate::config::AppConfig;
use crate::errors::json_method_not_allowed;
use crate::handlers;
use crate::logging::log_requests;
use crate::store::NoteStore;

pub type AppState = Arc<AppData>;

pub struct AppData {
    pub store: Arc<dyn NoteStore>,
}

impl AppData {
    pub fn new(store: Arc<dyn NoteStore>) -> AppState {
        Arc::new(Self { store })
    }
}

fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_notes).post(handlers::create_note))
        .route("/clear/all", delete(handlers::delete_all_notes))
        .route(
            "/:id",
            get(handlers::get_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
}

pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .nest("/api/notes", note_routes())
        .route("/api/test", get(handlers::health));

    // Without a frontend bundle, unknown paths still answer in JSON.
    let router = match &config.static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router.fallback(handlers::not_found),
    };

    router
        .layer(middleware::map_response(json_method_not_allowed))
        .layer(middleware::from_fn(log_requests))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
