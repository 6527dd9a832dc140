//! Demo data loader
//!
//! Reads `students.json`, `matieres.json`, `notes.json` and
//! `professors.json` from a directory and replaces the four collections
//! with their content. Records use the create-payload shape plus an
//! optional `id`, so notes can point at seeded students and subjects.
//! Everything is validated before anything is deleted, and the replacement
//! runs in one transaction.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::ApiResult;
use crate::payloads::{MatierePayload, NotePayload, ProfessorPayload, StudentPayload};
use gradebook_common::db::{delete_all, Matiere, Note, Professor, Student};

#[derive(Debug, Deserialize)]
struct SeedRecord<P> {
    id: Option<Uuid>,
    #[serde(flatten)]
    payload: P,
}

/// Records inserted per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub students: usize,
    pub matieres: usize,
    pub notes: usize,
    pub professors: usize,
}

async fn load<P: DeserializeOwned>(dir: &Path, filename: &str) -> Result<Vec<SeedRecord<P>>> {
    let path = dir.join(filename);
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Validate each record, keeping a provided id
fn build<P, T>(
    filename: &str,
    records: Vec<SeedRecord<P>>,
    create: impl Fn(P) -> ApiResult<T>,
    set_id: impl Fn(&mut T, Uuid),
) -> Result<Vec<T>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let mut entity = create(record.payload)
                .with_context(|| format!("{} record {} is invalid", filename, index))?;
            if let Some(id) = record.id {
                set_id(&mut entity, id);
            }
            Ok(entity)
        })
        .collect()
}

/// Replace all collections with the data found in `dir`
pub async fn seed_from_dir(pool: &SqlitePool, dir: &Path) -> Result<SeedSummary> {
    let students = build(
        "students.json",
        load::<StudentPayload>(dir, "students.json").await?,
        StudentPayload::create,
        |s: &mut Student, id| s.id = id,
    )?;
    let matieres = build(
        "matieres.json",
        load::<MatierePayload>(dir, "matieres.json").await?,
        MatierePayload::create,
        |m: &mut Matiere, id| m.id = id,
    )?;
    let notes = build(
        "notes.json",
        load::<NotePayload>(dir, "notes.json").await?,
        NotePayload::create,
        |n: &mut Note, id| n.id = id,
    )?;
    let professors = build(
        "professors.json",
        load::<ProfessorPayload>(dir, "professors.json").await?,
        ProfessorPayload::create,
        |p: &mut Professor, id| p.id = id,
    )?;

    // One transaction: a rejected insert (duplicate email, repeated id)
    // rolls the deletes back too
    let mut tx = pool.begin().await?;

    delete_all::<Student>(&mut *tx).await?;
    delete_all::<Matiere>(&mut *tx).await?;
    delete_all::<Note>(&mut *tx).await?;
    delete_all::<Professor>(&mut *tx).await?;

    for student in &students {
        db::students::insert_student(&mut *tx, student)
            .await
            .with_context(|| format!("Cannot insert student {}", student.email))?;
    }
    for matiere in &matieres {
        db::matieres::insert_matiere(&mut *tx, matiere)
            .await
            .with_context(|| format!("Cannot insert matiere {}", matiere.name))?;
    }
    for note in &notes {
        db::notes::insert_note(&mut *tx, note)
            .await
            .with_context(|| format!("Cannot insert note {}", note.id))?;
    }
    for professor in &professors {
        db::professors::insert_professor(&mut *tx, professor)
            .await
            .with_context(|| format!("Cannot insert professor {}", professor.email))?;
    }

    tx.commit().await?;

    let summary = SeedSummary {
        students: students.len(),
        matieres: matieres.len(),
        notes: notes.len(),
        professors: professors.len(),
    };
    info!(
        "Seeded {} students, {} matieres, {} notes, {} professors",
        summary.students, summary.matieres, summary.notes, summary.professors
    );

    Ok(summary)
}
