//! Subject endpoints, including per-subject statistics

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, ApiJson, ApiQuery, MessageResponse};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page};
use crate::payloads::MatierePayload;
use crate::query::{parse_id, Filter, Sort, SortDirection};
use crate::stats::{subject_stats, StatsSortKey, SubjectStats};
use crate::AppState;
use gradebook_common::db::{delete_by_id, find_all, find_by_id, Matiere, Record};

const SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("coefficient", "coefficient"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const DEFAULT_SORT: Sort = Sort {
    column: "name",
    direction: SortDirection::Asc,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatiereSearchQuery {
    pub q: Option<String>,
    pub min_coeff: Option<String>,
    pub max_coeff: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// GET /matieres
pub async fn list_matieres(State(state): State<AppState>) -> ApiResult<Json<Vec<Matiere>>> {
    Ok(Json(find_all(&state.db).await?))
}

/// POST /matieres
pub async fn create_matiere(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MatierePayload>,
) -> ApiResult<(StatusCode, Json<Matiere>)> {
    let matiere = payload.create()?;
    db::matieres::insert_matiere(&state.db, &matiere).await?;

    info!("Created matiere {} ({})", matiere.id, matiere.name);
    Ok((StatusCode::CREATED, Json(matiere)))
}

/// GET /matieres/search
pub async fn search_matieres(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MatiereSearchQuery>,
) -> ApiResult<Json<Page<Matiere>>> {
    let mut filter = Filter::new();
    filter.contains(query.q.as_deref());
    filter.number_range(
        "coefficient",
        ("minCoeff", query.min_coeff.as_deref()),
        ("maxCoeff", query.max_coeff.as_deref()),
    )?;

    let sort = Sort::resolve(
        SORT_FIELDS,
        query.sort.as_deref(),
        query.order.as_deref(),
        DEFAULT_SORT,
    )?;
    let pagination = calculate_pagination(query.page.as_deref(), query.limit.as_deref());

    Ok(Json(db::search(&state.db, &filter, &sort, pagination).await?))
}

/// GET /matieres/stats
pub async fn get_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<Json<Vec<SubjectStats>>> {
    let key = StatsSortKey::parse(query.sort.as_deref())?;
    let direction = SortDirection::parse(query.order.as_deref(), SortDirection::Desc);

    Ok(Json(subject_stats(&state.db, key, direction).await?))
}

/// GET /matieres/:id
pub async fn get_matiere(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Matiere>> {
    let id = parse_id(&id)?;
    find_by_id::<Matiere>(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Matiere::LABEL))
}

/// PUT /matieres/:id
pub async fn update_matiere(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<MatierePayload>,
) -> ApiResult<Json<Matiere>> {
    let id = parse_id(&id)?;
    let existing = find_by_id::<Matiere>(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(Matiere::LABEL))?;

    let matiere = payload.apply(existing)?;
    if !db::matieres::update_matiere(&state.db, &matiere).await? {
        return Err(ApiError::not_found(Matiere::LABEL));
    }

    Ok(Json(matiere))
}

/// DELETE /matieres/:id
///
/// Notes in the subject are kept; averages then weigh them 1.
pub async fn delete_matiere(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    if !delete_by_id::<Matiere>(&state.db, id).await? {
        return Err(ApiError::not_found(Matiere::LABEL));
    }

    info!("Deleted matiere {}", id);
    Ok(deleted(Matiere::LABEL))
}

pub fn matiere_routes() -> Router<AppState> {
    Router::new()
        .route("/matieres", get(list_matieres).post(create_matiere))
        .route("/matieres/search", get(search_matieres))
        .route("/matieres/stats", get(get_stats))
        .route(
            "/matieres/:id",
            get(get_matiere).put(update_matiere).delete(delete_matiere),
        )
}
