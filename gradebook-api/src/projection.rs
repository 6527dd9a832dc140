//! Denormalized student view
//!
//! A student with every one of their notes, each note carrying its subject
//! inline (or `null` when the subject no longer exists).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::ApiResult;
use gradebook_common::db::{find_by_id, find_by_ids, Matiere, Note, Student};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithMatiere {
    pub id: Uuid,
    pub value: f64,
    #[serde(rename = "type")]
    pub evaluation: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub matiere: Option<Matiere>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentFull {
    #[serde(flatten)]
    pub student: Student,
    pub notes: Vec<NoteWithMatiere>,
}

/// Attach each note's subject through an id index
pub fn attach_matieres(notes: Vec<Note>, matieres: Vec<Matiere>) -> Vec<NoteWithMatiere> {
    let index: HashMap<Uuid, Matiere> = matieres.into_iter().map(|m| (m.id, m)).collect();

    notes
        .into_iter()
        .map(|note| NoteWithMatiere {
            id: note.id,
            value: note.value,
            evaluation: note.evaluation,
            date: note.date,
            created_at: note.created_at,
            updated_at: note.updated_at,
            matiere: index.get(&note.matiere).cloned(),
        })
        .collect()
}

/// Full view of a student, `None` if the student does not exist
pub async fn build_student_full(
    pool: &SqlitePool,
    student_id: Uuid,
) -> ApiResult<Option<StudentFull>> {
    let Some(student) = find_by_id::<Student>(pool, student_id).await? else {
        return Ok(None);
    };

    let notes = db::notes::notes_for_student(pool, student_id).await?;

    let mut matiere_ids: Vec<Uuid> = notes.iter().map(|n| n.matiere).collect();
    matiere_ids.sort();
    matiere_ids.dedup();
    let matieres = find_by_ids::<Matiere>(pool, &matiere_ids).await?;

    Ok(Some(StudentFull {
        student,
        notes: attach_matieres(notes, matieres),
    }))
}
