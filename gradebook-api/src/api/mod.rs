//! HTTP API handlers for gradebook-api

pub mod export;
pub mod extract;
pub mod health;
pub mod matieres;
pub mod notes;
pub mod professors;
pub mod students;

use axum::Json;
use serde::Serialize;

pub use export::export_routes;
pub use extract::{ApiJson, ApiQuery};
pub use health::health_routes;
pub use matieres::matiere_routes;
pub use notes::note_routes;
pub use professors::professor_routes;
pub use students::student_routes;

/// Body of a successful DELETE
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn deleted(label: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("{} deleted", label),
    })
}
