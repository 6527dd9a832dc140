//! Request bodies and their validation
//!
//! Every field is optional at the serde level so that a single payload type
//! serves both create (all required fields checked) and partial update
//! (missing fields keep their stored value, then the merged record is
//! checked again). Failures are collected per field and reported together.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::query::parse_date;
use gradebook_common::db::{
    format_timestamp, now, Matiere, Note, Professor, Student, DEFAULT_EVALUATION_TYPE,
};

pub const MIN_COEFFICIENT: f64 = 1.0;
pub const MIN_NOTE_VALUE: f64 = 0.0;
pub const MAX_NOTE_VALUE: f64 = 20.0;

const REQUIRED: &str = "is required";

/// Trimmed text; blank counts as missing
fn required_text(errors: &mut ValidationErrors, field: &str, raw: Option<String>) -> Option<String> {
    match raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(text) => Some(text),
        None => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required_email(errors: &mut ValidationErrors, raw: Option<String>) -> Option<String> {
    let email = required_text(errors, "email", raw)?.to_lowercase();
    if !email.contains('@') {
        errors.add("email", "must be a valid email address");
        return None;
    }
    Some(email)
}

/// JSON number or numeric string
fn required_number(errors: &mut ValidationErrors, field: &str, raw: Option<&Value>) -> Option<f64> {
    let number = match raw {
        None | Some(Value::Null) => {
            errors.add(field, REQUIRED);
            return None;
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match number.filter(|n| n.is_finite()) {
        Some(n) => Some(n),
        None => {
            errors.add(field, "must be a number");
            None
        }
    }
}

fn required_id(errors: &mut ValidationErrors, field: &str, raw: Option<String>) -> Option<Uuid> {
    let text = required_text(errors, field, raw)?;
    match Uuid::parse_str(&text) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "must be a valid identifier");
            None
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPayload {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub grade: Option<String>,
}

struct StudentFields {
    firstname: String,
    lastname: String,
    email: String,
    grade: String,
}

impl StudentPayload {
    fn validate(self) -> ApiResult<StudentFields> {
        let mut errors = ValidationErrors::new();
        let firstname = required_text(&mut errors, "firstname", self.firstname);
        let lastname = required_text(&mut errors, "lastname", self.lastname);
        let email = required_email(&mut errors, self.email);
        let grade = required_text(&mut errors, "grade", self.grade);

        match (firstname, lastname, email, grade) {
            (Some(firstname), Some(lastname), Some(email), Some(grade)) if errors.is_empty() => {
                Ok(StudentFields {
                    firstname,
                    lastname,
                    email,
                    grade,
                })
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }

    pub fn create(self) -> ApiResult<Student> {
        let f = self.validate()?;
        Ok(Student::new(f.firstname, f.lastname, f.email, f.grade))
    }

    pub fn apply(self, existing: Student) -> ApiResult<Student> {
        let merged = StudentPayload {
            firstname: self.firstname.or_else(|| Some(existing.firstname.clone())),
            lastname: self.lastname.or_else(|| Some(existing.lastname.clone())),
            email: self.email.or_else(|| Some(existing.email.clone())),
            grade: self.grade.or_else(|| Some(existing.grade.clone())),
        };
        let f = merged.validate()?;

        Ok(Student {
            firstname: f.firstname,
            lastname: f.lastname,
            email: f.email,
            grade: f.grade,
            updated_at: now(),
            ..existing
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessorPayload {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub matieres: Option<Vec<String>>,
}

struct ProfessorFields {
    firstname: String,
    lastname: String,
    email: String,
    matieres: Vec<Uuid>,
}

/// Parse subject ids, dropping repeats after the first occurrence
fn subject_list(errors: &mut ValidationErrors, raw: Option<Vec<String>>) -> Option<Vec<Uuid>> {
    let Some(raw) = raw else {
        errors.add("matieres", REQUIRED);
        return None;
    };

    let mut ids: Vec<Uuid> = Vec::with_capacity(raw.len());
    let mut valid = true;
    for entry in raw {
        match Uuid::parse_str(entry.trim()) {
            Ok(id) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            Err(_) => {
                errors.add("matieres", format!("contains an invalid identifier: {}", entry));
                valid = false;
            }
        }
    }

    valid.then_some(ids)
}

impl ProfessorPayload {
    fn validate(self) -> ApiResult<ProfessorFields> {
        let mut errors = ValidationErrors::new();
        let firstname = required_text(&mut errors, "firstname", self.firstname);
        let lastname = required_text(&mut errors, "lastname", self.lastname);
        let email = required_email(&mut errors, self.email);
        let matieres = subject_list(&mut errors, self.matieres);

        match (firstname, lastname, email, matieres) {
            (Some(firstname), Some(lastname), Some(email), Some(matieres)) if errors.is_empty() => {
                Ok(ProfessorFields {
                    firstname,
                    lastname,
                    email,
                    matieres,
                })
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }

    pub fn create(self) -> ApiResult<Professor> {
        let f = self.validate()?;
        Ok(Professor::new(f.firstname, f.lastname, f.email, f.matieres))
    }

    pub fn apply(self, existing: Professor) -> ApiResult<Professor> {
        let merged = ProfessorPayload {
            firstname: self.firstname.or_else(|| Some(existing.firstname.clone())),
            lastname: self.lastname.or_else(|| Some(existing.lastname.clone())),
            email: self.email.or_else(|| Some(existing.email.clone())),
            matieres: self
                .matieres
                .or_else(|| Some(existing.matieres.iter().map(Uuid::to_string).collect())),
        };
        let f = merged.validate()?;

        Ok(Professor {
            firstname: f.firstname,
            lastname: f.lastname,
            email: f.email,
            matieres: f.matieres,
            updated_at: now(),
            ..existing
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatierePayload {
    pub name: Option<String>,
    pub coefficient: Option<Value>,
    pub description: Option<String>,
}

struct MatiereFields {
    name: String,
    coefficient: f64,
    description: Option<String>,
}

impl MatierePayload {
    fn validate(self) -> ApiResult<MatiereFields> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", self.name);
        let coefficient = required_number(&mut errors, "coefficient", self.coefficient.as_ref());
        if let Some(c) = coefficient {
            if c < MIN_COEFFICIENT {
                errors.add("coefficient", format!("must be at least {}", MIN_COEFFICIENT));
            }
        }

        match (name, coefficient) {
            (Some(name), Some(coefficient)) if errors.is_empty() => Ok(MatiereFields {
                name,
                coefficient,
                description: optional_text(self.description),
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }

    pub fn create(self) -> ApiResult<Matiere> {
        let f = self.validate()?;
        Ok(Matiere::new(f.name, f.coefficient, f.description))
    }

    pub fn apply(self, existing: Matiere) -> ApiResult<Matiere> {
        let merged = MatierePayload {
            name: self.name.or_else(|| Some(existing.name.clone())),
            coefficient: self
                .coefficient
                .or_else(|| Some(Value::from(existing.coefficient))),
            description: self.description.or_else(|| existing.description.clone()),
        };
        let f = merged.validate()?;

        Ok(Matiere {
            name: f.name,
            coefficient: f.coefficient,
            description: f.description,
            updated_at: now(),
            ..existing
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePayload {
    pub student: Option<String>,
    pub matiere: Option<String>,
    pub value: Option<Value>,
    #[serde(rename = "type")]
    pub evaluation: Option<String>,
    pub date: Option<String>,
}

struct NoteFields {
    student: Uuid,
    matiere: Uuid,
    value: f64,
    evaluation: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl NotePayload {
    fn validate(self) -> ApiResult<NoteFields> {
        let mut errors = ValidationErrors::new();
        let student = required_id(&mut errors, "student", self.student);
        let matiere = required_id(&mut errors, "matiere", self.matiere);
        let value = required_number(&mut errors, "value", self.value.as_ref());
        if let Some(v) = value {
            if !(MIN_NOTE_VALUE..=MAX_NOTE_VALUE).contains(&v) {
                errors.add(
                    "value",
                    format!("must be between {} and {}", MIN_NOTE_VALUE, MAX_NOTE_VALUE),
                );
            }
        }

        let date = match optional_text(self.date) {
            None => None,
            Some(raw) => match parse_date("date", &raw) {
                Ok(ts) => Some(ts),
                Err(_) => {
                    errors.add("date", "must be a valid date");
                    None
                }
            },
        };

        match (student, matiere, value) {
            (Some(student), Some(matiere), Some(value)) if errors.is_empty() => Ok(NoteFields {
                student,
                matiere,
                value,
                evaluation: optional_text(self.evaluation),
                date,
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }

    pub fn create(self) -> ApiResult<Note> {
        let f = self.validate()?;
        Ok(Note::new(f.student, f.matiere, f.value, f.evaluation, f.date))
    }

    pub fn apply(self, existing: Note) -> ApiResult<Note> {
        let merged = NotePayload {
            student: self.student.or_else(|| Some(existing.student.to_string())),
            matiere: self.matiere.or_else(|| Some(existing.matiere.to_string())),
            value: self.value.or_else(|| Some(Value::from(existing.value))),
            evaluation: self.evaluation.or_else(|| Some(existing.evaluation.clone())),
            date: self.date.or_else(|| Some(format_timestamp(&existing.date))),
        };
        let f = merged.validate()?;

        Ok(Note {
            student: f.student,
            matiere: f.matiere,
            value: f.value,
            evaluation: f
                .evaluation
                .unwrap_or_else(|| DEFAULT_EVALUATION_TYPE.to_string()),
            date: f.date.unwrap_or(existing.date),
            updated_at: now(),
            ..existing
        })
    }
}
