//! Integration tests for gradebook-api endpoints
//!
//! Each test drives the real router against a fresh in-memory database.

use std::path::Path;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use gradebook_api::{build_router, seed::seed_from_dir, AppState};
use gradebook_common::db::init_in_memory;

struct TestApp {
    router: Router,
    pool: SqlitePool,
    exports: TempDir,
}

/// Test helper: app over an in-memory database, exports into a temp dir
async fn setup_app() -> TestApp {
    let pool = init_in_memory().await.expect("Should create in-memory database");
    let exports = tempfile::tempdir().expect("Should create temp dir");
    let router = build_router(AppState::new(pool.clone(), exports.path().join("exports")));

    TestApp {
        router,
        pool,
        exports,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    async fn student(&self, firstname: &str, lastname: &str, grade: &str) -> String {
        let email = format!("{}.{}@univ.fr", firstname, lastname).to_lowercase();
        let (status, body) = self
            .post(
                "/students",
                json!({ "firstname": firstname, "lastname": lastname, "email": email, "grade": grade }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn matiere(&self, name: &str, coefficient: f64) -> String {
        let (status, body) = self
            .post("/matieres", json!({ "name": name, "coefficient": coefficient }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn note(&self, student: &str, matiere: &str, value: f64) -> String {
        self.note_with(json!({ "student": student, "matiere": matiere, "value": value }))
            .await
    }

    async fn note_with(&self, body: Value) -> String {
        let (status, body) = self.post("/notes", body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

const UNKNOWN_ID: &str = "00000000-0000-4000-8000-000000000000";

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "gradebook-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Averages
// =============================================================================

#[tokio::test]
async fn test_weighted_average_of_student() {
    let app = setup_app().await;
    let student = app.student("Ada", "Lovelace", "L1").await;
    let a = app.matiere("Maths", 2.0).await;
    let b = app.matiere("Anglais", 1.0).await;
    app.note(&student, &a, 10.0).await;
    app.note(&student, &b, 16.0).await;

    let (status, body) = app.get(&format!("/notes/student/{}", student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["studentId"], student.as_str());
    assert_eq!(body["average"], 12.0);
    assert_eq!(body["count"], 2);

    let (_, naive) = app
        .get(&format!("/notes/student/{}?weighted=false", student))
        .await;
    assert_eq!(naive["average"], 13.0);
}

#[tokio::test]
async fn test_average_without_notes_is_null() {
    let app = setup_app().await;

    let (status, body) = app.get(&format!("/notes/student/{}", UNKNOWN_ID)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["average"].is_null());
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_deleted_matiere_keeps_notes_with_fallback_weight() {
    let app = setup_app().await;
    let student = app.student("Alan", "Turing", "L2").await;
    let heavy = app.matiere("Physique", 3.0).await;
    let light = app.matiere("Histoire", 1.0).await;
    app.note(&student, &heavy, 10.0).await;
    app.note(&student, &light, 18.0).await;

    let (_, before) = app.get(&format!("/notes/student/{}", student)).await;
    assert_eq!(before["average"], 12.0);

    let (status, body) = app.send("DELETE", &format!("/matieres/{}", heavy), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Matiere deleted");

    let (_, notes) = app.get("/notes").await;
    assert_eq!(notes.as_array().unwrap().len(), 2);

    let (_, after) = app.get(&format!("/notes/student/{}", student)).await;
    assert_eq!(after["average"], 14.0);
    assert_eq!(after["count"], 2);

    // The identity-joined average only counts resolvable subjects
    let (status, joined) = app.get(&format!("/students/{}/average", student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["average"], 18.0);
    assert_eq!(joined["count"], 1);
    assert_eq!(joined["lastname"], "Turing");
}

#[tokio::test]
async fn test_identity_average_unknown_student_is_404() {
    let app = setup_app().await;

    let (status, body) = app.get(&format!("/students/{}/average", UNKNOWN_ID)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_identity_average_without_notes() {
    let app = setup_app().await;
    let student = app.student("Grace", "Hopper", "M1").await;

    let (status, body) = app.get(&format!("/students/{}/average", student)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["average"].is_null());
    assert_eq!(body["count"], 0);
    assert_eq!(body["firstname"], "Grace");
}

#[tokio::test]
async fn test_top_averages_ranking() {
    let app = setup_app().await;
    let maths = app.matiere("Maths", 2.0).await;
    let first = app.student("Emma", "Moreau", "L1").await;
    let second = app.student("Chloe", "Durand", "L1").await;
    let third = app.student("Bruno", "Petit", "L1").await;
    app.student("Nobody", "Without", "L1").await;

    app.note(&first, &maths, 18.0).await;
    app.note(&second, &maths, 14.0).await;
    app.note(&second, &maths, 16.0).await;
    app.note(&third, &maths, 9.0).await;

    let (status, body) = app.get("/students/top/averages?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let ranked = body.as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["studentId"], first.as_str());
    assert_eq!(ranked[0]["average"], 18.0);
    assert_eq!(ranked[1]["studentId"], second.as_str());
    assert_eq!(ranked[1]["average"], 15.0);
    assert_eq!(ranked[1]["count"], 2);

    // Default limit is 5; students without notes are absent
    let (_, all) = app.get("/students/top/averages").await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

// =============================================================================
// Search and pagination
// =============================================================================

#[tokio::test]
async fn test_student_search_paginates_filtered_set() {
    let app = setup_app().await;
    for (i, name) in ["Martin", "Bernard", "Dubois", "Thomas", "Robert"].iter().enumerate() {
        app.student(&format!("Student{}", i), name, "L1").await;
    }
    app.student("Other", "Richard", "L2").await;

    let (status, body) = app.get("/students/search?grade=L1&page=1&limit=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["total"], 5);
    assert_eq!(body["pages"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 2);
    // Default sort: lastname ascending
    assert_eq!(body["items"][0]["lastname"], "Bernard");
    assert_eq!(body["items"][1]["lastname"], "Dubois");
}

#[tokio::test]
async fn test_search_clamps_paging_parameters() {
    let app = setup_app().await;
    app.student("Ada", "Lovelace", "L1").await;

    let (status, body) = app.get("/students/search?page=-5&limit=500").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 100);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_free_text_search_is_case_insensitive() {
    let app = setup_app().await;
    app.student("Ada", "Lovelace", "L1").await;
    app.student("Alan", "Turing", "L1").await;

    let (_, body) = app.get("/students/search?q=LOVE").await;

    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["firstname"], "Ada");
}

#[tokio::test]
async fn test_free_text_search_folds_accented_letters() {
    let app = setup_app().await;
    let (status, _) = app
        .post(
            "/students",
            json!({ "firstname": "Jean", "lastname": "Élise", "email": "jean@x.fr", "grade": "L1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.student("Alan", "Turing", "L1").await;

    for q in ["%C3%89lise", "%C3%A9lise", "%C3%89LISE"] {
        let (status, body) = app.get(&format!("/students/search?q={}", q)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1, "q={}", q);
        assert_eq!(body["items"][0]["lastname"], "Élise");
    }

    app.matiere("Éducation physique", 1.0).await;
    let (_, body) = app.get("/matieres/search?q=%C3%A9ducation").await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_free_text_search_follows_updates() {
    let app = setup_app().await;
    let id = app.student("Ada", "Lovelace", "L1").await;

    let (status, _) = app
        .send("PUT", &format!("/students/{}", id), Some(json!({ "lastname": "Byron" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/students/search?q=BYRON").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["lastname"], "Byron");
}

#[tokio::test]
async fn test_invalid_sort_field_is_400() {
    let app = setup_app().await;

    let (status, body) = app.get("/students/search?sort=password").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_undecodable_query_string_is_json_400() {
    let app = setup_app().await;

    let (status, body) = app.get("/students/search?page=1&page=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = app.get("/notes/search?minValue=1&minValue=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_matiere_search_coefficient_bounds() {
    let app = setup_app().await;
    app.matiere("Maths", 4.0).await;
    app.matiere("Physique", 3.0).await;
    app.matiere("Anglais", 1.0).await;

    let (status, body) = app
        .get("/matieres/search?minCoeff=2&maxCoeff=3&sort=coefficient&order=desc")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Physique");

    let (status, body) = app.get("/matieres/search?minCoeff=two").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("minCoeff"));
}

#[tokio::test]
async fn test_note_search_filters_combine() {
    let app = setup_app().await;
    let student = app.student("Ada", "Lovelace", "L1").await;
    let other = app.student("Alan", "Turing", "L1").await;
    let maths = app.matiere("Maths", 2.0).await;

    app.note_with(json!({ "student": student, "matiere": maths, "value": 12, "date": "2024-01-05" }))
        .await;
    app.note_with(json!({ "student": student, "matiere": maths, "value": 15, "date": "2024-02-10" }))
        .await;
    app.note_with(json!({ "student": student, "matiere": maths, "value": 8, "date": "2024-02-12" }))
        .await;
    app.note_with(json!({ "student": other, "matiere": maths, "value": 17, "date": "2024-02-11" }))
        .await;

    let (status, body) = app
        .get(&format!(
            "/notes/search?student={}&minValue=10&from=2024-02-01&to=2024-03-01",
            student
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["value"], 15.0);

    // Default sort: date descending
    let (_, body) = app.get(&format!("/notes/search?matiere={}", maths)).await;
    let values: Vec<f64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![8.0, 17.0, 15.0, 12.0]);
}

#[tokio::test]
async fn test_note_search_rejects_bad_parameters() {
    let app = setup_app().await;

    let (status, body) = app.get("/notes/search?student=42").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_IDENTIFIER");

    let (status, _) = app.get("/notes/search?from=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Stats and projections
// =============================================================================

#[tokio::test]
async fn test_matiere_stats() {
    let app = setup_app().await;
    let student = app.student("Ada", "Lovelace", "L1").await;
    let maths = app.matiere("Maths", 4.0).await;
    let english = app.matiere("Anglais", 1.0).await;
    app.matiere("Latin", 1.0).await;

    app.note(&student, &maths, 10.0).await;
    app.note(&student, &maths, 14.0).await;
    app.note(&student, &maths, 12.0).await;
    app.note(&student, &english, 16.0).await;

    let (status, body) = app.get("/matieres/stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats = body.as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["name"], "Anglais");
    assert_eq!(stats[0]["avg"], 16.0);
    assert_eq!(stats[1]["matiereId"], maths.as_str());
    assert_eq!(stats[1]["count"], 3);
    assert_eq!(stats[1]["avg"], 12.0);

    let (_, by_count) = app.get("/matieres/stats?sort=count&order=desc").await;
    assert_eq!(by_count[0]["name"], "Maths");

    let (status, _) = app.get("/matieres/stats?sort=name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_student_full_projection() {
    let app = setup_app().await;
    let student = app.student("Ada", "Lovelace", "L1").await;
    let maths = app.matiere("Maths", 2.0).await;
    app.note_with(json!({ "student": student, "matiere": maths, "value": 14, "date": "2024-03-01" }))
        .await;
    app.note_with(json!({
        "student": student, "matiere": UNKNOWN_ID, "value": 9, "type": "Oral", "date": "2024-01-01"
    }))
    .await;

    let (status, body) = app.get(&format!("/students/{}/full", student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada.lovelace@univ.fr");

    let notes = body["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 2);
    assert!(notes[0]["matiere"].is_null());
    assert_eq!(notes[0]["type"], "Oral");
    assert_eq!(notes[1]["matiere"]["name"], "Maths");
    assert_eq!(notes[1]["type"], "Contrôle");

    let (status, _) = app.get(&format!("/students/{}/full", UNKNOWN_ID)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_professor_subjects_and_search() {
    let app = setup_app().await;
    let maths = app.matiere("Maths", 2.0).await;
    let physics = app.matiere("Physique", 2.0).await;

    let (status, professor) = app
        .post(
            "/professors",
            json!({
                "firstname": "Helene",
                "lastname": "Girard",
                "email": "Helene.Girard@Univ.fr",
                "matieres": [maths, UNKNOWN_ID, maths]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(professor["email"], "helene.girard@univ.fr");
    assert_eq!(professor["matieres"].as_array().unwrap().len(), 2);

    let id = professor["id"].as_str().unwrap();
    let (status, body) = app.get(&format!("/professors/{}/matieres", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["professor"]["lastname"], "Girard");
    let matieres = body["matieres"].as_array().unwrap();
    assert_eq!(matieres.len(), 1);
    assert_eq!(matieres[0]["id"], maths.as_str());

    let (_, found) = app.get(&format!("/professors/search?matiere={}", maths)).await;
    assert_eq!(found["total"], 1);
    let (_, none) = app.get(&format!("/professors/search?matiere={}", physics)).await;
    assert_eq!(none["total"], 0);
}

// =============================================================================
// CRUD and errors
// =============================================================================

#[tokio::test]
async fn test_student_crud_cycle() {
    let app = setup_app().await;
    let id = app.student("Ada", "Lovelace", "L1").await;

    let (status, body) = app.get(&format!("/students/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grade"], "L1");
    assert!(body["createdAt"].is_string());

    let (status, body) = app
        .send("PUT", &format!("/students/{}", id), Some(json!({ "grade": "L2" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grade"], "L2");
    assert_eq!(body["firstname"], "Ada");

    let (_, list) = app.get("/students").await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = app.send("DELETE", &format!("/students/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Student deleted");

    let (status, _) = app.get(&format!("/students/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send("DELETE", &format!("/students/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_date_is_stored_as_returned() {
    let app = setup_app().await;
    let student = app.student("Ada", "Lovelace", "L1").await;
    let maths = app.matiere("Maths", 2.0).await;

    let (status, created) = app
        .post(
            "/notes",
            json!({ "student": student, "matiere": maths, "value": 12, "date": "2024-01-10T10:00:00.123456Z" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["date"], "2024-01-10T10:00:00.123Z");

    let id = created["id"].as_str().unwrap();
    let (_, fetched) = app.get(&format!("/notes/{}", id)).await;
    assert_eq!(fetched["date"], created["date"]);

    let (_, updated) = app
        .send(
            "PUT",
            &format!("/notes/{}", id),
            Some(json!({ "date": "2024-02-01T08:30:00.987654321+01:00" })),
        )
        .await;
    assert_eq!(updated["date"], "2024-02-01T07:30:00.987Z");
    let (_, fetched) = app.get(&format!("/notes/{}", id)).await;
    assert_eq!(fetched["date"], updated["date"]);
}

#[tokio::test]
async fn test_update_unknown_is_404() {
    let app = setup_app().await;

    let (status, _) = app
        .send("PUT", &format!("/notes/{}", UNKNOWN_ID), Some(json!({ "value": 12 })))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_email_is_400() {
    let app = setup_app().await;
    app.student("Ada", "Lovelace", "L1").await;

    let (status, body) = app
        .post(
            "/students",
            json!({ "firstname": "Other", "lastname": "Ada", "email": "ADA.LOVELACE@univ.fr", "grade": "L2" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_VALUE");
    assert_eq!(body["error"]["field"], "email");
}

#[tokio::test]
async fn test_duplicate_matiere_name_on_update() {
    let app = setup_app().await;
    app.matiere("Maths", 2.0).await;
    let physics = app.matiere("Physique", 2.0).await;

    let (status, body) = app
        .send("PUT", &format!("/matieres/{}", physics), Some(json!({ "name": "Maths" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "name");
}

#[tokio::test]
async fn test_malformed_id_is_400() {
    let app = setup_app().await;

    for uri in ["/students/not-an-id", "/notes/student/123", "/professors/xyz/matieres"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["code"], "INVALID_IDENTIFIER");
    }
}

#[tokio::test]
async fn test_invalid_body_is_422_with_details() {
    let app = setup_app().await;

    let (status, body) = app
        .post("/notes", json!({ "student": UNKNOWN_ID, "value": 25 }))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["matiere"][0], "is required");
    assert_eq!(body["error"]["details"]["value"][0], "must be between 0 and 20");
}

#[tokio::test]
async fn test_malformed_json_is_422() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/matieres")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["details"]["body"].is_array());
}

#[tokio::test]
async fn test_numeric_strings_are_cast() {
    let app = setup_app().await;

    let (status, body) = app
        .post("/matieres", json!({ "name": "Maths", "coefficient": "3" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["coefficient"], 3.0);
}

// =============================================================================
// Export and seed
// =============================================================================

#[tokio::test]
async fn test_export_writes_readable_files() {
    let app = setup_app().await;
    let student = app.student("Ada", "Lovelace", "L1").await;
    let maths = app.matiere("Maths", 2.0).await;
    app.note(&student, &maths, 15.0).await;

    let (status, body) = app.get("/export/students").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let file = app.exports.path().join("exports").join("students_export.json");
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(written[0]["id"], student.as_str());

    let (status, body) = app.get("/export/all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["notes"], 1);
    assert_eq!(body["counts"]["professors"], 0);

    let all_file = app.exports.path().join("exports").join("db_export_all.json");
    let all: Value = serde_json::from_str(&std::fs::read_to_string(&all_file).unwrap()).unwrap();
    assert!(all["exportedAt"].is_string());
    assert_eq!(all["matieres"][0]["name"], "Maths");

    let (status, _) = app.get("/export/grades").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seed_demo_data() {
    let app = setup_app().await;
    app.student("Stale", "Record", "L3").await;

    let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../data");
    let summary = seed_from_dir(&app.pool, &data_dir).await.unwrap();
    assert_eq!(summary.students, 5);
    assert_eq!(summary.matieres, 4);

    let (_, students) = app.get("/students").await;
    let students = students.as_array().unwrap();
    assert_eq!(students.len(), 5);
    assert!(students.iter().all(|s| s["lastname"] != "Record"));

    let (_, found) = app.get("/students/search?q=CHLO%C3%89").await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["items"][0]["firstname"], "Chloé");

    // Seeded notes reference seeded students and subjects
    let (_, top) = app.get("/students/top/averages?limit=50").await;
    assert_eq!(top.as_array().unwrap().len(), 5);
}
