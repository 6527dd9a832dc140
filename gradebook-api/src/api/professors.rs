//! Professor endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{deleted, ApiJson, ApiQuery, MessageResponse};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page};
use crate::payloads::ProfessorPayload;
use crate::query::{parse_id, Filter, Sort, SortDirection};
use crate::AppState;
use gradebook_common::db::{delete_by_id, find_all, find_by_id, find_by_ids, Matiere, Professor, Record};

const SORT_FIELDS: &[(&str, &str)] = &[
    ("firstname", "firstname"),
    ("lastname", "lastname"),
    ("email", "email"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const DEFAULT_SORT: Sort = Sort {
    column: "lastname",
    direction: SortDirection::Asc,
};

#[derive(Debug, Default, Deserialize)]
pub struct ProfessorSearchQuery {
    pub q: Option<String>,
    /// Subject id the professor must teach
    pub matiere: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfessorIdentity {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ProfessorMatieres {
    pub professor: ProfessorIdentity,
    pub matieres: Vec<Matiere>,
}

/// GET /professors
pub async fn list_professors(State(state): State<AppState>) -> ApiResult<Json<Vec<Professor>>> {
    Ok(Json(find_all(&state.db).await?))
}

/// POST /professors
pub async fn create_professor(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ProfessorPayload>,
) -> ApiResult<(StatusCode, Json<Professor>)> {
    let professor = payload.create()?;
    db::professors::insert_professor(&state.db, &professor).await?;

    info!("Created professor {} ({})", professor.id, professor.email);
    Ok((StatusCode::CREATED, Json(professor)))
}

/// GET /professors/search
pub async fn search_professors(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProfessorSearchQuery>,
) -> ApiResult<Json<Page<Professor>>> {
    let mut filter = Filter::new();
    filter.contains(query.q.as_deref());
    filter.has_element("matieres", query.matiere.as_deref())?;

    let sort = Sort::resolve(
        SORT_FIELDS,
        query.sort.as_deref(),
        query.order.as_deref(),
        DEFAULT_SORT,
    )?;
    let pagination = calculate_pagination(query.page.as_deref(), query.limit.as_deref());

    Ok(Json(db::search(&state.db, &filter, &sort, pagination).await?))
}

/// GET /professors/:id
pub async fn get_professor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Professor>> {
    let id = parse_id(&id)?;
    find_by_id::<Professor>(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Professor::LABEL))
}

/// PUT /professors/:id
pub async fn update_professor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ProfessorPayload>,
) -> ApiResult<Json<Professor>> {
    let id = parse_id(&id)?;
    let existing = find_by_id::<Professor>(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(Professor::LABEL))?;

    let professor = payload.apply(existing)?;
    if !db::professors::update_professor(&state.db, &professor).await? {
        return Err(ApiError::not_found(Professor::LABEL));
    }

    Ok(Json(professor))
}

/// DELETE /professors/:id
pub async fn delete_professor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    if !delete_by_id::<Professor>(&state.db, id).await? {
        return Err(ApiError::not_found(Professor::LABEL));
    }

    info!("Deleted professor {}", id);
    Ok(deleted(Professor::LABEL))
}

/// GET /professors/:id/matieres
///
/// Subject ids that no longer resolve are skipped.
pub async fn get_professor_matieres(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProfessorMatieres>> {
    let id = parse_id(&id)?;
    let professor = find_by_id::<Professor>(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(Professor::LABEL))?;

    let matieres = find_by_ids::<Matiere>(&state.db, &professor.matieres).await?;

    Ok(Json(ProfessorMatieres {
        professor: ProfessorIdentity {
            id: professor.id,
            firstname: professor.firstname,
            lastname: professor.lastname,
            email: professor.email,
        },
        matieres,
    }))
}

pub fn professor_routes() -> Router<AppState> {
    Router::new()
        .route("/professors", get(list_professors).post(create_professor))
        .route("/professors/search", get(search_professors))
        .route(
            "/professors/:id",
            get(get_professor)
                .put(update_professor)
                .delete(delete_professor),
        )
        .route("/professors/:id/matieres", get(get_professor_matieres))
}
