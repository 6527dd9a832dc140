//! Database operations for gradebook-api
//!
//! Entity writes and the join queries behind the engines. Plain reads go
//! through the generic accessors in `gradebook_common::db`.

pub mod matieres;
pub mod notes;
pub mod professors;
pub mod students;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::pagination::{Page, Pagination};
use crate::query::{Filter, Sort};
use gradebook_common::db::Record;

/// Filtered, sorted, paged read of any collection
///
/// `total` is counted with the same filter and ignores paging.
pub async fn search<T: Record>(
    pool: &SqlitePool,
    filter: &Filter,
    sort: &Sort,
    pagination: Pagination,
) -> Result<Page<T>, sqlx::Error> {
    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
    filter.push_where(&mut count_qb);
    let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM {}", T::COLUMNS, T::TABLE));
    filter.push_where(&mut qb);
    sort.push_order_by(&mut qb);
    qb.push(" LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.skip);

    debug!(table = T::TABLE, sql = qb.sql(), total, "search");

    let rows = qb.build().fetch_all(pool).await?;
    let items = rows
        .iter()
        .map(T::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(pagination, total, items))
}
