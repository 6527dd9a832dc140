//! Export endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::{ApiError, ApiResult};
use crate::export::{export_all, export_kind, ExportAllResult, ExportKind, ExportResult};
use crate::AppState;

/// GET /export/:kind
pub async fn export_one(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<ExportResult>> {
    let kind = ExportKind::parse(&kind)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown export: {}", kind)))?;

    Ok(Json(export_kind(&state.db, &state.export_dir, kind).await?))
}

/// GET /export/all
pub async fn export_everything(State(state): State<AppState>) -> ApiResult<Json<ExportAllResult>> {
    Ok(Json(export_all(&state.db, &state.export_dir).await?))
}

pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/export/all", get(export_everything))
        .route("/export/:kind", get(export_one))
}
