//! JSON file export of the collections

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use gradebook_common::db::{find_all, format_timestamp, now, Matiere, Note, Professor, Record, Student};

pub const ALL_EXPORT_FILENAME: &str = "db_export_all.json";

/// Exportable collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Students,
    Matieres,
    Notes,
    Professors,
}

impl ExportKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "students" => Some(ExportKind::Students),
            "matieres" => Some(ExportKind::Matieres),
            "notes" => Some(ExportKind::Notes),
            "professors" => Some(ExportKind::Professors),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportKind::Students => "students",
            ExportKind::Matieres => "matieres",
            ExportKind::Notes => "notes",
            ExportKind::Professors => "professors",
        }
    }

    pub fn filename(self) -> String {
        format!("{}_export.json", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub message: String,
    pub file: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportCounts {
    pub students: usize,
    pub matieres: usize,
    pub notes: usize,
    pub professors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportAllResult {
    pub message: String,
    pub file: String,
    pub counts: ExportCounts,
}

/// Pretty-print `value` to `dir/filename`, creating `dir` if needed
async fn write_json<T: Serialize + ?Sized>(dir: &Path, filename: &str, value: &T) -> ApiResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| ApiError::Internal(format!("Cannot serialize export: {}", e)))?;

    let path = dir.join(filename);
    tokio::fs::write(&path, body).await?;
    Ok(path)
}

async fn export_collection<T: Record + Serialize>(
    pool: &SqlitePool,
    dir: &Path,
    kind: ExportKind,
) -> ApiResult<ExportResult> {
    let records: Vec<T> = find_all(pool).await?;
    let path = write_json(dir, &kind.filename(), &records).await?;

    info!("Exported {} {} to {}", records.len(), kind.as_str(), path.display());

    Ok(ExportResult {
        message: format!("Exported {} {}", records.len(), kind.as_str()),
        file: path.display().to_string(),
        count: records.len(),
    })
}

/// Write one collection to `<dir>/<kind>_export.json`
pub async fn export_kind(pool: &SqlitePool, dir: &Path, kind: ExportKind) -> ApiResult<ExportResult> {
    match kind {
        ExportKind::Students => export_collection::<Student>(pool, dir, kind).await,
        ExportKind::Matieres => export_collection::<Matiere>(pool, dir, kind).await,
        ExportKind::Notes => export_collection::<Note>(pool, dir, kind).await,
        ExportKind::Professors => export_collection::<Professor>(pool, dir, kind).await,
    }
}

/// Write every collection into a single document
pub async fn export_all(pool: &SqlitePool, dir: &Path) -> ApiResult<ExportAllResult> {
    let students: Vec<Student> = find_all(pool).await?;
    let matieres: Vec<Matiere> = find_all(pool).await?;
    let notes: Vec<Note> = find_all(pool).await?;
    let professors: Vec<Professor> = find_all(pool).await?;

    let counts = ExportCounts {
        students: students.len(),
        matieres: matieres.len(),
        notes: notes.len(),
        professors: professors.len(),
    };

    let document = json!({
        "exportedAt": format_timestamp(&now()),
        "students": students,
        "matieres": matieres,
        "notes": notes,
        "professors": professors,
    });
    let path = write_json(dir, ALL_EXPORT_FILENAME, &document).await?;

    info!("Exported all collections to {}", path.display());

    Ok(ExportAllResult {
        message: "Exported all collections".to_string(),
        file: path.display().to_string(),
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::matieres::insert_matiere;
    use gradebook_common::db::init_in_memory;

    #[test]
    fn test_kind_names() {
        assert_eq!(ExportKind::parse("notes"), Some(ExportKind::Notes));
        assert_eq!(ExportKind::parse("all"), None);
        assert_eq!(ExportKind::Matieres.filename(), "matieres_export.json");
    }

    #[tokio::test]
    async fn test_export_creates_directory() {
        let pool = init_in_memory().await.unwrap();
        insert_matiere(&pool, &Matiere::new("Maths".into(), 2.0, None)).await.unwrap();

        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("exports");

        let result = export_kind(&pool, &dir, ExportKind::Matieres).await.unwrap();
        assert_eq!(result.count, 1);

        let written = std::fs::read_to_string(dir.join("matieres_export.json")).unwrap();
        let parsed: Vec<Matiere> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[0].name, "Maths");
    }
}
