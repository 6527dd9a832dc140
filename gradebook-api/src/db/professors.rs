//! Professor persistence
//!
//! The subject list is written as a JSON array of ids.

use sqlx::{Executor, Sqlite};

use gradebook_common::db::{format_timestamp, Professor};

pub async fn insert_professor<'e, E>(executor: E, professor: &Professor) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO professors (id, firstname, lastname, email, matieres, search_key, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(professor.id.to_string())
    .bind(&professor.firstname)
    .bind(&professor.lastname)
    .bind(&professor.email)
    .bind(professor.matieres_json())
    .bind(professor.search_key())
    .bind(format_timestamp(&professor.created_at))
    .bind(format_timestamp(&professor.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_professor<'e, E>(executor: E, professor: &Professor) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE professors
        SET firstname = ?, lastname = ?, email = ?, matieres = ?, search_key = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&professor.firstname)
    .bind(&professor.lastname)
    .bind(&professor.email)
    .bind(professor.matieres_json())
    .bind(professor.search_key())
    .bind(format_timestamp(&professor.updated_at))
    .bind(professor.id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
