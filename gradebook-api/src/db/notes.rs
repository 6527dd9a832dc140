//! Note persistence and the join queries behind averages and stats

use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::averages::RankingRow;
use crate::stats::SubjectStats;
use gradebook_common::db::{format_timestamp, Note, Record};

pub async fn insert_note<'e, E>(executor: E, note: &Note) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO notes (id, student_id, matiere_id, value, type, date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(note.id.to_string())
    .bind(note.student.to_string())
    .bind(note.matiere.to_string())
    .bind(note.value)
    .bind(&note.evaluation)
    .bind(format_timestamp(&note.date))
    .bind(format_timestamp(&note.created_at))
    .bind(format_timestamp(&note.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_note(pool: &SqlitePool, note: &Note) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE notes
        SET student_id = ?, matiere_id = ?, value = ?, type = ?, date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(note.student.to_string())
    .bind(note.matiere.to_string())
    .bind(note.value)
    .bind(&note.evaluation)
    .bind(format_timestamp(&note.date))
    .bind(format_timestamp(&note.updated_at))
    .bind(note.id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// A student's notes, oldest first
pub async fn notes_for_student(pool: &SqlitePool, student_id: Uuid) -> Result<Vec<Note>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM notes WHERE student_id = ? ORDER BY date ASC, id ASC",
        Note::COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(student_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(Note::from_row).collect()
}

/// (value, coefficient) for each of a student's notes
///
/// The coefficient is `None` when the subject no longer exists.
pub async fn grades_for_student(
    pool: &SqlitePool,
    student_id: Uuid,
) -> Result<Vec<(f64, Option<f64>)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT n.value AS value, m.coefficient AS coefficient
        FROM notes n
        LEFT JOIN matieres m ON m.id = n.matiere_id
        WHERE n.student_id = ?
        "#,
    )
    .bind(student_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<(f64, Option<f64>), sqlx::Error> {
            Ok((row.try_get("value")?, row.try_get("coefficient")?))
        })
        .collect()
}

/// Notes whose student and subject both resolve, optionally for one student
pub async fn ranking_rows(
    pool: &SqlitePool,
    student_id: Option<Uuid>,
) -> Result<Vec<RankingRow>, sqlx::Error> {
    let base = r#"
        SELECT n.student_id AS student_id, s.firstname AS firstname, s.lastname AS lastname,
               n.value AS value, m.coefficient AS coefficient
        FROM notes n
        INNER JOIN matieres m ON m.id = n.matiere_id
        INNER JOIN students s ON s.id = n.student_id
        "#;

    let rows = match student_id {
        Some(id) => {
            let sql = format!("{} WHERE n.student_id = ?", base);
            sqlx::query(&sql)
                .bind(id.to_string())
                .fetch_all(pool)
                .await?
        }
        None => sqlx::query(base).fetch_all(pool).await?,
    };

    rows.iter()
        .map(|row| -> Result<RankingRow, sqlx::Error> {
            Ok(RankingRow {
                student_id: uuid_column(row, "student_id")?,
                firstname: row.try_get("firstname")?,
                lastname: row.try_get("lastname")?,
                value: row.try_get("value")?,
                coefficient: row.try_get("coefficient")?,
            })
        })
        .collect()
}

/// Count and unweighted mean per resolvable subject, unsorted
pub async fn subject_stats_rows(pool: &SqlitePool) -> Result<Vec<SubjectStats>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m.id AS matiere_id, m.name AS name, m.coefficient AS coefficient,
               COUNT(n.id) AS count, AVG(n.value) AS avg
        FROM notes n
        INNER JOIN matieres m ON m.id = n.matiere_id
        GROUP BY m.id, m.name, m.coefficient
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<SubjectStats, sqlx::Error> {
            Ok(SubjectStats {
                matiere_id: uuid_column(row, "matiere_id")?,
                name: row.try_get("name")?,
                coefficient: row.try_get("coefficient")?,
                count: row.try_get("count")?,
                avg: row.try_get("avg")?,
            })
        })
        .collect()
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{matieres::insert_matiere, students::insert_student};
    use gradebook_common::db::{delete_by_id, init_in_memory, Matiere, Student};

    #[tokio::test]
    async fn test_grades_left_join_keeps_orphans() {
        let pool = init_in_memory().await.unwrap();
        let student = Student::new("Ada".into(), "Lovelace".into(), "ada@uni.fr".into(), "L1".into());
        let maths = Matiere::new("Maths".into(), 2.0, None);
        insert_student(&pool, &student).await.unwrap();
        insert_matiere(&pool, &maths).await.unwrap();

        insert_note(&pool, &Note::new(student.id, maths.id, 10.0, None, None)).await.unwrap();
        insert_note(&pool, &Note::new(student.id, Uuid::new_v4(), 16.0, None, None)).await.unwrap();

        let mut grades = grades_for_student(&pool, student.id).await.unwrap();
        grades.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(grades, vec![(10.0, Some(2.0)), (16.0, None)]);

        // Ranking only sees the resolvable note
        let rows = ranking_rows(&pool, Some(student.id)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].coefficient, 2.0);
        assert_eq!(rows[0].firstname, "Ada");
    }

    #[tokio::test]
    async fn test_ranking_skips_deleted_student() {
        let pool = init_in_memory().await.unwrap();
        let student = Student::new("Alan".into(), "Turing".into(), "alan@uni.fr".into(), "L2".into());
        let maths = Matiere::new("Maths".into(), 1.0, None);
        insert_student(&pool, &student).await.unwrap();
        insert_matiere(&pool, &maths).await.unwrap();
        insert_note(&pool, &Note::new(student.id, maths.id, 12.0, None, None)).await.unwrap();

        assert_eq!(ranking_rows(&pool, None).await.unwrap().len(), 1);
        delete_by_id::<Student>(&pool, student.id).await.unwrap();
        assert!(ranking_rows(&pool, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subject_stats_group_by() {
        let pool = init_in_memory().await.unwrap();
        let maths = Matiere::new("Maths".into(), 3.0, None);
        let empty = Matiere::new("Latin".into(), 1.0, None);
        insert_matiere(&pool, &maths).await.unwrap();
        insert_matiere(&pool, &empty).await.unwrap();

        let student = Uuid::new_v4();
        for value in [8.0, 12.0, 16.0] {
            insert_note(&pool, &Note::new(student, maths.id, value, None, None)).await.unwrap();
        }

        let stats = subject_stats_rows(&pool).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].matiere_id, maths.id);
        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[0].avg, 12.0);
    }

    #[tokio::test]
    async fn test_notes_for_student_ordered_by_date() {
        use chrono::{TimeZone, Utc};

        let pool = init_in_memory().await.unwrap();
        let student = Uuid::new_v4();
        let matiere = Uuid::new_v4();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();

        insert_note(&pool, &Note::new(student, matiere, 11.0, None, Some(late))).await.unwrap();
        insert_note(&pool, &Note::new(student, matiere, 14.0, None, Some(early))).await.unwrap();
        insert_note(&pool, &Note::new(Uuid::new_v4(), matiere, 5.0, None, None)).await.unwrap();

        let notes = notes_for_student(&pool, student).await.unwrap();
        let values: Vec<f64> = notes.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![14.0, 11.0]);
    }
}
