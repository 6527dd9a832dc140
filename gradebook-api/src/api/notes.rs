//! Note endpoints and the per-student average

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, ApiJson, ApiQuery, MessageResponse};
use crate::averages::{self, StudentAverage};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page};
use crate::payloads::NotePayload;
use crate::query::{non_empty, parse_id, Filter, Sort, SortDirection};
use crate::AppState;
use gradebook_common::db::{delete_by_id, find_all, find_by_id, Note, Record};

const SORT_FIELDS: &[(&str, &str)] = &[
    ("value", "value"),
    ("date", "date"),
    ("type", "type"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const DEFAULT_SORT: Sort = Sort {
    column: "date",
    direction: SortDirection::Desc,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSearchQuery {
    pub student: Option<String>,
    pub matiere: Option<String>,
    #[serde(rename = "type")]
    pub evaluation: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AverageQuery {
    /// `false` or `0` for the unweighted mean
    pub weighted: Option<String>,
}

impl AverageQuery {
    fn is_weighted(&self) -> bool {
        !matches!(
            non_empty(self.weighted.as_deref()).map(str::to_ascii_lowercase).as_deref(),
            Some("false") | Some("0")
        )
    }
}

/// GET /notes
pub async fn list_notes(State(state): State<AppState>) -> ApiResult<Json<Vec<Note>>> {
    Ok(Json(find_all(&state.db).await?))
}

/// POST /notes
///
/// References are stored as given; they are not checked for existence.
pub async fn create_note(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NotePayload>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let note = payload.create()?;
    db::notes::insert_note(&state.db, &note).await?;

    info!("Created note {} for student {}", note.id, note.student);
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /notes/search
pub async fn search_notes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NoteSearchQuery>,
) -> ApiResult<Json<Page<Note>>> {
    let mut filter = Filter::new();
    filter.equals_id("student_id", query.student.as_deref())?;
    filter.equals_id("matiere_id", query.matiere.as_deref())?;
    filter.equals("type", query.evaluation.as_deref());
    filter.number_range(
        "value",
        ("minValue", query.min_value.as_deref()),
        ("maxValue", query.max_value.as_deref()),
    )?;
    filter.date_range("date", query.from.as_deref(), query.to.as_deref())?;

    let sort = Sort::resolve(
        SORT_FIELDS,
        query.sort.as_deref(),
        query.order.as_deref(),
        DEFAULT_SORT,
    )?;
    let pagination = calculate_pagination(query.page.as_deref(), query.limit.as_deref());

    Ok(Json(db::search(&state.db, &filter, &sort, pagination).await?))
}

/// GET /notes/student/:id
pub async fn get_student_average(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<AverageQuery>,
) -> ApiResult<Json<StudentAverage>> {
    let id = parse_id(&id)?;
    Ok(Json(
        averages::student_average(&state.db, id, query.is_weighted()).await?,
    ))
}

/// GET /notes/:id
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = parse_id(&id)?;
    find_by_id::<Note>(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Note::LABEL))
}

/// PUT /notes/:id
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<NotePayload>,
) -> ApiResult<Json<Note>> {
    let id = parse_id(&id)?;
    let existing = find_by_id::<Note>(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(Note::LABEL))?;

    let note = payload.apply(existing)?;
    if !db::notes::update_note(&state.db, &note).await? {
        return Err(ApiError::not_found(Note::LABEL));
    }

    Ok(Json(note))
}

/// DELETE /notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    if !delete_by_id::<Note>(&state.db, id).await? {
        return Err(ApiError::not_found(Note::LABEL));
    }

    info!("Deleted note {}", id);
    Ok(deleted(Note::LABEL))
}

pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/search", get(search_notes))
        .route("/notes/student/:id", get(get_student_average))
        .route(
            "/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: Option<&str>) -> AverageQuery {
        AverageQuery {
            weighted: raw.map(str::to_string),
        }
    }

    #[test]
    fn test_weighted_by_default() {
        assert!(query(None).is_weighted());
        assert!(query(Some("true")).is_weighted());
        assert!(query(Some("")).is_weighted());
        assert!(!query(Some("false")).is_weighted());
        assert!(!query(Some("0")).is_weighted());
        assert!(!query(Some("FALSE")).is_weighted());
    }
}
