//! Per-subject statistics
//!
//! Counts and means are computed by the store (GROUP BY over notes joined
//! to their subject); ordering is applied here so the secondary key is
//! always the subject name.

use std::cmp::Ordering;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::query::{non_empty, SortDirection};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub matiere_id: Uuid,
    pub name: String,
    pub coefficient: f64,
    /// Number of notes in the subject
    pub count: i64,
    /// Unweighted mean of those notes
    pub avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSortKey {
    Count,
    Avg,
}

impl StatsSortKey {
    /// `count` or `avg` (default)
    pub fn parse(raw: Option<&str>) -> ApiResult<Self> {
        match non_empty(raw) {
            None | Some("avg") => Ok(StatsSortKey::Avg),
            Some("count") => Ok(StatsSortKey::Count),
            Some(other) => Err(ApiError::BadRequest(format!(
                "Invalid sort field: {} (expected 'count' or 'avg')",
                other
            ))),
        }
    }
}

/// Sort by `key` in `direction`, then by name ascending
pub fn sort_stats(stats: &mut [SubjectStats], key: StatsSortKey, direction: SortDirection) {
    stats.sort_by(|a, b| {
        let primary = match key {
            StatsSortKey::Count => a.count.cmp(&b.count),
            StatsSortKey::Avg => a.avg.total_cmp(&b.avg),
        };
        let primary = match direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        match primary {
            Ordering::Equal => a.name.cmp(&b.name),
            other => other,
        }
    });
}

/// Stats for every subject that has at least one note
pub async fn subject_stats(
    pool: &SqlitePool,
    key: StatsSortKey,
    direction: SortDirection,
) -> ApiResult<Vec<SubjectStats>> {
    let mut stats = db::notes::subject_stats_rows(pool).await?;
    sort_stats(&mut stats, key, direction);
    Ok(stats)
}
