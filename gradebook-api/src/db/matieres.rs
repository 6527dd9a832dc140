//! Subject persistence

use sqlx::{Executor, Sqlite};

use gradebook_common::db::{format_timestamp, Matiere};

pub async fn insert_matiere<'e, E>(executor: E, matiere: &Matiere) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO matieres (id, name, coefficient, description, search_key, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(matiere.id.to_string())
    .bind(&matiere.name)
    .bind(matiere.coefficient)
    .bind(&matiere.description)
    .bind(matiere.search_key())
    .bind(format_timestamp(&matiere.created_at))
    .bind(format_timestamp(&matiere.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_matiere<'e, E>(executor: E, matiere: &Matiere) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE matieres
        SET name = ?, coefficient = ?, description = ?, search_key = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&matiere.name)
    .bind(matiere.coefficient)
    .bind(&matiere.description)
    .bind(matiere.search_key())
    .bind(format_timestamp(&matiere.updated_at))
    .bind(matiere.id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
