//! Student endpoints
//!
//! CRUD, search, the full projection, the identity-joined average and the
//! top-N ranking.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, ApiJson, ApiQuery, MessageResponse};
use crate::averages::{self, ranking_limit, RankedStudent};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page};
use crate::payloads::StudentPayload;
use crate::projection::{build_student_full, StudentFull};
use crate::query::{parse_id, Filter, Sort, SortDirection};
use crate::AppState;
use gradebook_common::db::{delete_by_id, find_all, find_by_id, Record, Student};

const SORT_FIELDS: &[(&str, &str)] = &[
    ("firstname", "firstname"),
    ("lastname", "lastname"),
    ("email", "email"),
    ("grade", "grade"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const DEFAULT_SORT: Sort = Sort {
    column: "lastname",
    direction: SortDirection::Asc,
};

#[derive(Debug, Default, Deserialize)]
pub struct StudentSearchQuery {
    pub q: Option<String>,
    pub grade: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<String>,
}

/// GET /students
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Json<Vec<Student>>> {
    Ok(Json(find_all(&state.db).await?))
}

/// POST /students
pub async fn create_student(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<StudentPayload>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    let student = payload.create()?;
    db::students::insert_student(&state.db, &student).await?;

    info!("Created student {} ({})", student.id, student.email);
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /students/search
pub async fn search_students(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StudentSearchQuery>,
) -> ApiResult<Json<Page<Student>>> {
    let mut filter = Filter::new();
    filter
        .contains(query.q.as_deref())
        .equals("grade", query.grade.as_deref());

    let sort = Sort::resolve(
        SORT_FIELDS,
        query.sort.as_deref(),
        query.order.as_deref(),
        DEFAULT_SORT,
    )?;
    let pagination = calculate_pagination(query.page.as_deref(), query.limit.as_deref());

    Ok(Json(db::search(&state.db, &filter, &sort, pagination).await?))
}

/// GET /students/top/averages
pub async fn top_averages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RankingQuery>,
) -> ApiResult<Json<Vec<RankedStudent>>> {
    let limit = ranking_limit(query.limit.as_deref());
    Ok(Json(averages::top_students(&state.db, limit).await?))
}

/// GET /students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Student>> {
    let id = parse_id(&id)?;
    find_by_id::<Student>(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Student::LABEL))
}

/// PUT /students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<StudentPayload>,
) -> ApiResult<Json<Student>> {
    let id = parse_id(&id)?;
    let existing = find_by_id::<Student>(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(Student::LABEL))?;

    let student = payload.apply(existing)?;
    if !db::students::update_student(&state.db, &student).await? {
        return Err(ApiError::not_found(Student::LABEL));
    }

    Ok(Json(student))
}

/// DELETE /students/:id
///
/// Notes referring to the student are kept.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    if !delete_by_id::<Student>(&state.db, id).await? {
        return Err(ApiError::not_found(Student::LABEL));
    }

    info!("Deleted student {}", id);
    Ok(deleted(Student::LABEL))
}

/// GET /students/:id/full
pub async fn get_student_full(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StudentFull>> {
    let id = parse_id(&id)?;
    build_student_full(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Student::LABEL))
}

/// GET /students/:id/average
pub async fn get_student_average(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RankedStudent>> {
    let id = parse_id(&id)?;
    averages::student_average_with_identity(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Student::LABEL))
}

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/search", get(search_students))
        .route("/students/top/averages", get(top_averages))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/:id/full", get(get_student_full))
        .route("/students/:id/average", get(get_student_average))
}
