//! Student persistence

use sqlx::{Executor, Sqlite};

use gradebook_common::db::{format_timestamp, Student};

pub async fn insert_student<'e, E>(executor: E, student: &Student) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO students (id, firstname, lastname, email, grade, search_key, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(student.id.to_string())
    .bind(&student.firstname)
    .bind(&student.lastname)
    .bind(&student.email)
    .bind(&student.grade)
    .bind(student.search_key())
    .bind(format_timestamp(&student.created_at))
    .bind(format_timestamp(&student.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

/// Overwrite every mutable column; returns whether the row exists
pub async fn update_student<'e, E>(executor: E, student: &Student) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE students
        SET firstname = ?, lastname = ?, email = ?, grade = ?, search_key = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&student.firstname)
    .bind(&student.lastname)
    .bind(&student.email)
    .bind(&student.grade)
    .bind(student.search_key())
    .bind(format_timestamp(&student.updated_at))
    .bind(student.id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
