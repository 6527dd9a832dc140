//! Average engine
//!
//! Weighted mean of a student's grades, Σ(value·coefficient)/Σ(coefficient),
//! and the top-N ranking across all students. Averages are never stored;
//! every call recomputes them from the notes.
//!
//! Two join semantics coexist, matching how each figure has always been
//! produced:
//! - per-student average (`/notes/student/:id`): every note counts, a note
//!   whose subject no longer exists weighs [`FALLBACK_COEFFICIENT`];
//! - ranking and the identity-joined average: only notes whose subject and
//!   student both resolve take part.

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::ApiResult;
use crate::pagination::coerce_int;
use gradebook_common::db::{find_by_id, Student};

/// Weight of a note whose subject cannot be resolved
pub const FALLBACK_COEFFICIENT: f64 = 1.0;

pub const DEFAULT_RANKING_LIMIT: i64 = 5;
pub const MAX_RANKING_LIMIT: i64 = 50;

/// Coefficient to use for a possibly unresolved subject
///
/// Missing, zero and non-finite coefficients all weigh 1.
pub fn effective_coefficient(coefficient: Option<f64>) -> f64 {
    match coefficient {
        Some(c) if c.is_finite() && c != 0.0 => c,
        _ => FALLBACK_COEFFICIENT,
    }
}

/// Running Σ(value·weight) / Σ(weight)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedMean {
    weighted_sum: f64,
    total_weight: f64,
    count: usize,
}

impl WeightedMean {
    pub fn push(&mut self, value: f64, weight: f64) {
        self.weighted_sum += value * weight;
        self.total_weight += weight;
        self.count += 1;
    }

    /// Number of values pushed
    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` when there is no data or the weights do not sum to a positive number
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 || self.total_weight <= 0.0 {
            None
        } else {
            Some(self.weighted_sum / self.total_weight)
        }
    }
}

/// Weighted mean of (value, subject coefficient) pairs
pub fn weighted_average<I>(grades: I) -> WeightedMean
where
    I: IntoIterator<Item = (f64, Option<f64>)>,
{
    let mut mean = WeightedMean::default();
    for (value, coefficient) in grades {
        mean.push(value, effective_coefficient(coefficient));
    }
    mean
}

/// Unweighted mean
pub fn naive_average<I>(values: I) -> WeightedMean
where
    I: IntoIterator<Item = f64>,
{
    let mut mean = WeightedMean::default();
    for value in values {
        mean.push(value, 1.0);
    }
    mean
}

/// Result of `GET /notes/student/:id`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAverage {
    pub student_id: Uuid,
    /// `null` means "no data", distinct from a zero average
    pub average: Option<f64>,
    pub count: usize,
}

/// One (student, note) pair with its resolved subject coefficient
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub student_id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub value: f64,
    pub coefficient: f64,
}

/// Ranking entry, also used for the identity-joined average
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    pub student_id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub average: Option<f64>,
    pub count: usize,
}

/// Group rows by student, average each group, best first
///
/// Students whose weights do not sum to a positive number are left out.
/// Equal averages are ordered by student id so the result is deterministic.
pub fn rank_students<I>(rows: I, limit: usize) -> Vec<RankedStudent>
where
    I: IntoIterator<Item = RankingRow>,
{
    let mut groups: BTreeMap<Uuid, (String, String, WeightedMean)> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry(row.student_id)
            .or_insert_with(|| (row.firstname, row.lastname, WeightedMean::default()));
        entry.2.push(row.value, row.coefficient);
    }

    let mut ranked: Vec<(f64, RankedStudent)> = groups
        .into_iter()
        .filter_map(|(student_id, (firstname, lastname, mean))| {
            mean.average().map(|average| {
                (
                    average,
                    RankedStudent {
                        student_id,
                        firstname,
                        lastname,
                        average: Some(average),
                        count: mean.count(),
                    },
                )
            })
        })
        .collect();

    ranked.sort_by(|(a, left), (b, right)| {
        b.total_cmp(a)
            .then_with(|| left.student_id.cmp(&right.student_id))
    });
    ranked.truncate(limit);

    ranked.into_iter().map(|(_, student)| student).collect()
}

/// `limit` query parameter of the ranking: default 5, clamped to [1, 50]
pub fn ranking_limit(raw: Option<&str>) -> usize {
    coerce_int(raw)
        .unwrap_or(DEFAULT_RANKING_LIMIT)
        .clamp(1, MAX_RANKING_LIMIT) as usize
}

/// Average of one student's notes; the student need not exist
pub async fn student_average(
    pool: &SqlitePool,
    student_id: Uuid,
    weighted: bool,
) -> ApiResult<StudentAverage> {
    let grades = db::notes::grades_for_student(pool, student_id).await?;

    let mean = if weighted {
        weighted_average(grades)
    } else {
        naive_average(grades.into_iter().map(|(value, _)| value))
    };

    Ok(StudentAverage {
        student_id,
        average: mean.average(),
        count: mean.count(),
    })
}

/// Weighted average joined with the student's identity
///
/// `None` when the student does not exist.
pub async fn student_average_with_identity(
    pool: &SqlitePool,
    student_id: Uuid,
) -> ApiResult<Option<RankedStudent>> {
    let Some(student) = find_by_id::<Student>(pool, student_id).await? else {
        return Ok(None);
    };

    let rows = db::notes::ranking_rows(pool, Some(student_id)).await?;
    let entry = rank_students(rows, 1).into_iter().next();

    Ok(Some(entry.unwrap_or(RankedStudent {
        student_id,
        firstname: student.firstname,
        lastname: student.lastname,
        average: None,
        count: 0,
    })))
}

/// Best `limit` students by weighted average
pub async fn top_students(pool: &SqlitePool, limit: usize) -> ApiResult<Vec<RankedStudent>> {
    let rows = db::notes::ranking_rows(pool, None).await?;
    Ok(rank_students(rows, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(student_id: Uuid, value: f64, coefficient: f64) -> RankingRow {
        RankingRow {
            student_id,
            firstname: "F".to_string(),
            lastname: "L".to_string(),
            value,
            coefficient,
        }
    }

    #[test]
    fn test_weighted_average_example() {
        // (10*2 + 16*1) / 3
        let mean = weighted_average([(10.0, Some(2.0)), (16.0, Some(1.0))]);
        assert_eq!(mean.average(), Some(12.0));
        assert_eq!(mean.count(), 2);
    }

    #[test]
    fn test_no_notes_is_null_not_zero() {
        let mean = weighted_average(Vec::<(f64, Option<f64>)>::new());
        assert_eq!(mean.average(), None);
        assert_eq!(mean.count(), 0);
    }

    #[test]
    fn test_unresolved_subject_weighs_one() {
        let with_fallback = weighted_average([(10.0, Some(3.0)), (18.0, None)]);
        let explicit = weighted_average([(10.0, Some(3.0)), (18.0, Some(1.0))]);
        assert_eq!(with_fallback.average(), explicit.average());
        assert_eq!(with_fallback.average(), Some(12.0));
    }

    #[test]
    fn test_zero_coefficient_falls_back() {
        assert_eq!(effective_coefficient(Some(0.0)), 1.0);
        assert_eq!(effective_coefficient(Some(f64::NAN)), 1.0);
        assert_eq!(effective_coefficient(Some(4.0)), 4.0);
        assert_eq!(effective_coefficient(None), 1.0);
    }

    #[test]
    fn test_non_positive_total_weight_is_null() {
        let mut mean = WeightedMean::default();
        mean.push(12.0, 2.0);
        mean.push(8.0, -2.0);
        assert_eq!(mean.average(), None);
        assert_eq!(mean.count(), 2);
    }

    #[test]
    fn test_weighted_average_is_convex() {
        let sets: &[&[(f64, f64)]] = &[
            &[(0.0, 1.0), (20.0, 5.0)],
            &[(7.5, 2.0), (13.0, 3.0), (9.25, 1.5)],
            &[(14.0, 1.0)],
            &[(20.0, 4.0), (20.0, 1.0), (0.5, 8.0), (11.0, 2.5)],
        ];
        for set in sets {
            let mean = weighted_average(set.iter().map(|(v, c)| (*v, Some(*c))));
            let avg = mean.average().unwrap();
            let min = set.iter().map(|(v, _)| *v).fold(f64::INFINITY, f64::min);
            let max = set.iter().map(|(v, _)| *v).fold(f64::NEG_INFINITY, f64::max);
            assert!(avg >= min - 1e-9 && avg <= max + 1e-9, "{} not in [{}, {}]", avg, min, max);
        }
    }

    #[test]
    fn test_naive_average_ignores_coefficients() {
        let mean = naive_average([10.0, 16.0]);
        assert_eq!(mean.average(), Some(13.0));
    }

    #[test]
    fn test_ranking_orders_and_truncates() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);
        let rows = vec![
            row(a, 10.0, 2.0),
            row(b, 18.0, 1.0),
            row(a, 16.0, 1.0),
            row(c, 14.0, 3.0),
        ];

        let ranked = rank_students(rows, 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].student_id, b);
        assert_eq!(ranked[0].average, Some(18.0));
        assert_eq!(ranked[1].student_id, c);
        assert_eq!(ranked[1].count, 1);
    }

    #[test]
    fn test_ranking_ties_broken_by_student_id() {
        let low = Uuid::from_u128(5);
        let high = Uuid::from_u128(9);
        let rows = vec![row(high, 12.0, 1.0), row(low, 12.0, 2.0)];

        let ranked = rank_students(rows, 10);

        assert_eq!(ranked[0].student_id, low);
        assert_eq!(ranked[1].student_id, high);
    }

    #[test]
    fn test_ranking_non_increasing() {
        let rows: Vec<RankingRow> = (0..30u128)
            .map(|i| row(Uuid::from_u128(i % 7), (i * 37 % 21) as f64, 1.0 + (i % 3) as f64))
            .collect();

        let ranked = rank_students(rows, 50);

        assert_eq!(ranked.len(), 7);
        assert!(ranked
            .windows(2)
            .all(|pair| pair[0].average >= pair[1].average));
    }

    #[test]
    fn test_ranking_limit_clamped() {
        assert_eq!(ranking_limit(None), 5);
        assert_eq!(ranking_limit(Some("0")), 1);
        assert_eq!(ranking_limit(Some("500")), 50);
        assert_eq!(ranking_limit(Some("abc")), 5);
        assert_eq!(ranking_limit(Some("12")), 12);
    }
}
