//! Database initialization against a real file
//!
//! Covers first-run creation, reopening an existing file and that the
//! schema survives a reopen.

use gradebook_common::db::init::init_database;
use tempfile::tempdir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("gradebook.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_rows() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("gradebook.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO students (id, firstname, lastname, email, grade, created_at, updated_at)
         VALUES ('s1', 'Ada', 'Lovelace', 'ada@uni.fr', 'L1', 'ts', 'ts')",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let reopened = init_database(&db_path).await;
    assert!(reopened.is_ok(), "Failed to open existing database: {:?}", reopened.err());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(&reopened.unwrap())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_unique_email_enforced() {
    let dir = tempdir().unwrap();
    let pool = init_database(&dir.path().join("gradebook.db")).await.unwrap();

    let insert = "INSERT INTO students (id, firstname, lastname, email, grade, created_at, updated_at)
                  VALUES (?, 'A', 'B', 'same@uni.fr', 'L1', 'ts', 'ts')";
    sqlx::query(insert).bind("s1").execute(&pool).await.unwrap();
    let duplicate = sqlx::query(insert).bind("s2").execute(&pool).await;

    let err = duplicate.expect_err("duplicate email must fail");
    let db_err = err.as_database_error().expect("should be a database error");
    assert!(db_err.is_unique_violation());
}

#[tokio::test]
async fn test_pragmas_apply_to_every_connection() {
    let dir = tempdir().unwrap();
    let pool = init_database(&dir.path().join("gradebook.db")).await.unwrap();

    let mut first = pool.acquire().await.unwrap();
    let mut second = pool.acquire().await.unwrap();

    for conn in [&mut first, &mut second] {
        let timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        assert_eq!(timeout, 5000);

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
