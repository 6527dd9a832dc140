//! gradebook-api library
//!
//! REST service over students, professors, subjects and notes, with
//! weighted averages, rankings and per-subject statistics computed on
//! every request from the stored notes.

use std::path::PathBuf;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod averages;
pub mod db;
pub mod error;
pub mod export;
pub mod pagination;
pub mod payloads;
pub mod projection;
pub mod query;
pub mod seed;
pub mod stats;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Directory receiving JSON exports
    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new(db: SqlitePool, export_dir: PathBuf) -> Self {
        Self { db, export_dir }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::student_routes())
        .merge(api::professor_routes())
        .merge(api::matiere_routes())
        .merge(api::note_routes())
        .merge(api::export_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
