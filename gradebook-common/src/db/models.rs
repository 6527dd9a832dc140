//! Database models
//!
//! Ids are UUID v4 stored as hyphenated TEXT. Timestamps are stored as
//! RFC 3339 text with millisecond precision and a `Z` suffix so that string
//! comparison in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

/// Evaluation type given to notes created without one
pub const DEFAULT_EVALUATION_TYPE: &str = "Contrôle";

/// A table-backed entity that can be read generically
pub trait Record: Sized + Send + Unpin {
    /// Table name
    const TABLE: &'static str;
    /// Column list for SELECT, in the order `from_row` expects
    const COLUMNS: &'static str;
    /// Human-readable entity name used in messages
    const LABEL: &'static str;

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Current time truncated to the stored precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Canonical storage form of a timestamp
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Lowercased free-text fields stored in the `search_key` column
///
/// SQLite `LIKE` only folds ASCII, so case folding happens here with full
/// Unicode rules and searches match a lowercased needle against this key.
/// Fields are joined with U+001F so a match cannot straddle two of them.
pub fn search_key(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| field.to_lowercase())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

fn decode_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    /// Class or year label, e.g. "L1"
    pub grade: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn new(firstname: String, lastname: String, email: String, grade: String) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4(),
            firstname,
            lastname,
            email,
            grade,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn search_key(&self) -> String {
        search_key(&[
            self.firstname.as_str(),
            self.lastname.as_str(),
            self.email.as_str(),
        ])
    }
}

impl Record for Student {
    const TABLE: &'static str = "students";
    const COLUMNS: &'static str = "id, firstname, lastname, email, grade, created_at, updated_at";
    const LABEL: &'static str = "Student";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: decode_uuid(row, "id")?,
            firstname: row.try_get("firstname")?,
            lastname: row.try_get("lastname")?,
            email: row.try_get("email")?,
            grade: row.try_get("grade")?,
            created_at: decode_timestamp(row, "created_at")?,
            updated_at: decode_timestamp(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professor {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    /// Subjects taught; not checked against the matieres collection
    pub matieres: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Professor {
    pub fn new(firstname: String, lastname: String, email: String, matieres: Vec<Uuid>) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4(),
            firstname,
            lastname,
            email,
            matieres,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// JSON array form stored in the `matieres` column
    pub fn matieres_json(&self) -> String {
        serde_json::Value::from(
            self.matieres
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>(),
        )
        .to_string()
    }

    pub fn search_key(&self) -> String {
        search_key(&[
            self.firstname.as_str(),
            self.lastname.as_str(),
            self.email.as_str(),
        ])
    }
}

impl Record for Professor {
    const TABLE: &'static str = "professors";
    const COLUMNS: &'static str =
        "id, firstname, lastname, email, matieres, created_at, updated_at";
    const LABEL: &'static str = "Professor";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let raw: String = row.try_get("matieres")?;
        let matieres: Vec<Uuid> =
            serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
                index: "matieres".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: decode_uuid(row, "id")?,
            firstname: row.try_get("firstname")?,
            lastname: row.try_get("lastname")?,
            email: row.try_get("email")?,
            matieres,
            created_at: decode_timestamp(row, "created_at")?,
            updated_at: decode_timestamp(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matiere {
    pub id: Uuid,
    pub name: String,
    /// Averaging weight, always >= 1
    pub coefficient: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Matiere {
    pub fn new(name: String, coefficient: f64, description: Option<String>) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4(),
            name,
            coefficient,
            description,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn search_key(&self) -> String {
        search_key(&[
            self.name.as_str(),
            self.description.as_deref().unwrap_or_default(),
        ])
    }
}

impl Record for Matiere {
    const TABLE: &'static str = "matieres";
    const COLUMNS: &'static str = "id, name, coefficient, description, created_at, updated_at";
    const LABEL: &'static str = "Matiere";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: decode_uuid(row, "id")?,
            name: row.try_get("name")?,
            coefficient: row.try_get("coefficient")?,
            description: row.try_get("description")?,
            created_at: decode_timestamp(row, "created_at")?,
            updated_at: decode_timestamp(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    /// Student reference (may dangle)
    pub student: Uuid,
    /// Matiere reference (may dangle)
    pub matiere: Uuid,
    /// Grade on a 0-20 scale
    pub value: f64,
    #[serde(rename = "type")]
    pub evaluation: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(
        student: Uuid,
        matiere: Uuid,
        value: f64,
        evaluation: Option<String>,
        date: Option<DateTime<Utc>>,
    ) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4(),
            student,
            matiere,
            value,
            evaluation: evaluation.unwrap_or_else(|| DEFAULT_EVALUATION_TYPE.to_string()),
            date: date.unwrap_or(ts),
            created_at: ts,
            updated_at: ts,
        }
    }
}

impl Record for Note {
    const TABLE: &'static str = "notes";
    const COLUMNS: &'static str =
        "id, student_id, matiere_id, value, type, date, created_at, updated_at";
    const LABEL: &'static str = "Note";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: decode_uuid(row, "id")?,
            student: decode_uuid(row, "student_id")?,
            matiere: decode_uuid(row, "matiere_id")?,
            value: row.try_get("value")?,
            evaluation: row.try_get("type")?,
            date: decode_timestamp(row, "date")?,
            created_at: decode_timestamp(row, "created_at")?,
            updated_at: decode_timestamp(row, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 9, 23, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 10, 8, 30, 0).unwrap();

        assert_eq!(format_timestamp(&earlier), "2024-01-09T23:00:00.000Z");
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }

    #[test]
    fn test_note_defaults() {
        let note = Note::new(Uuid::new_v4(), Uuid::new_v4(), 12.5, None, None);
        assert_eq!(note.evaluation, DEFAULT_EVALUATION_TYPE);
        assert_eq!(note.date, note.created_at);
    }

    #[test]
    fn test_note_serializes_evaluation_as_type() {
        let note = Note::new(Uuid::new_v4(), Uuid::new_v4(), 15.0, Some("Projet".into()), None);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "Projet");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("evaluation").is_none());
    }

    #[test]
    fn test_search_key_folds_accents() {
        let student = Student::new("Chloé".into(), "ÉLISE".into(), "chloe@uni.fr".into(), "L1".into());
        assert_eq!(student.search_key(), "chloé\u{1f}élise\u{1f}chloe@uni.fr");

        let matiere = Matiere::new("Mathématiques".into(), 2.0, None);
        assert_eq!(matiere.search_key(), "mathématiques\u{1f}");
    }

    #[test]
    fn test_professor_matieres_json() {
        let id = Uuid::parse_str("6f1c1c7e-6a8f-4f5a-9a52-1a6d1f5e9b01").unwrap();
        let prof = Professor::new("Ada".into(), "Lovelace".into(), "ada@uni.fr".into(), vec![id]);
        assert_eq!(
            prof.matieres_json(),
            r#"["6f1c1c7e-6a8f-4f5a-9a52-1a6d1f5e9b01"]"#
        );
    }
}
