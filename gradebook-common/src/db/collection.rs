//! Generic collection access for any [`Record`]
//!
//! Entity-specific writes live with the service; reads, counts and deletes
//! are the same for every table.

use super::models::Record;
use crate::Result;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

/// All records in insertion order
pub async fn find_all<T: Record>(pool: &SqlitePool) -> Result<Vec<T>> {
    let sql = format!("SELECT {} FROM {} ORDER BY rowid", T::COLUMNS, T::TABLE);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    let records = rows
        .iter()
        .map(T::from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Record by id, `None` if absent
pub async fn find_by_id<T: Record>(pool: &SqlitePool, id: Uuid) -> Result<Option<T>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", T::COLUMNS, T::TABLE);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(T::from_row(&row)?)),
        None => Ok(None),
    }
}

/// Records whose id is in `ids`; unknown ids are skipped
pub async fn find_by_ids<T: Record>(pool: &SqlitePool, ids: &[Uuid]) -> Result<Vec<T>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE id IN (",
        T::COLUMNS,
        T::TABLE
    ));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(") ORDER BY rowid");

    let rows = qb.build().fetch_all(pool).await?;
    let records = rows
        .iter()
        .map(T::from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Hard delete; returns whether a row was removed
pub async fn delete_by_id<T: Record>(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
    let result = sqlx::query(&sql)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove every record of the collection
/// Empty the table; runs on a pool or inside a transaction
pub async fn delete_all<'e, T: Record>(
    executor: impl Executor<'e, Database = Sqlite>,
) -> Result<u64> {
    let sql = format!("DELETE FROM {}", T::TABLE);
    let result = sqlx::query(&sql).execute(executor).await?;
    Ok(result.rows_affected())
}

pub async fn count<T: Record>(pool: &SqlitePool) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
    let total: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(total)
}
