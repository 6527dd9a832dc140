//! Filter builder for search endpoints
//!
//! Turns optional query parameters into SQL conditions. Every provided
//! parameter adds one condition; conditions are AND-ed. Free-text search is
//! a case-insensitive substring match against the `search_key` column,
//! which holds the record's searchable fields already lowercased. Column
//! names only ever come from `'static` whitelists; user input is always
//! bound.

use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use gradebook_common::db::format_timestamp;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Bound value of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Real(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Substring of the lowercased `search_key` column
    Contains { needle: String },
    Equals {
        column: &'static str,
        value: Value,
    },
    /// Inclusive lower bound
    AtLeast {
        column: &'static str,
        value: Value,
    },
    /// Inclusive upper bound
    AtMost {
        column: &'static str,
        value: Value,
    },
    /// JSON array column contains `value`
    HasElement {
        column: &'static str,
        value: String,
    },
}

/// Trimmed parameter, `None` when absent or blank
pub fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an identifier from a path or query parameter
pub fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidIdentifier(raw.to_string()))
}

/// Parse a number from a query parameter
pub fn parse_number(field: &str, raw: &str) -> ApiResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::InvalidCast {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC)
///
/// Truncated to milliseconds, the precision timestamps are stored with.
pub fn parse_date(field: &str, raw: &str) -> ApiResult<DateTime<Utc>> {
    let raw_trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw_trimmed) {
        return Ok(ts.with_timezone(&Utc).trunc_subsecs(3));
    }

    NaiveDate::parse_from_str(raw_trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ApiError::InvalidCast {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// LIKE pattern matching `needle` anywhere, with wildcards escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Free-text `q`, folded the same way as `search_key`
    pub fn contains(&mut self, raw: Option<&str>) -> &mut Self {
        if let Some(needle) = non_empty(raw) {
            self.conditions.push(Condition::Contains {
                needle: needle.to_lowercase(),
            });
        }
        self
    }

    /// Exact text match
    pub fn equals(&mut self, column: &'static str, raw: Option<&str>) -> &mut Self {
        if let Some(value) = non_empty(raw) {
            self.conditions.push(Condition::Equals {
                column,
                value: Value::Text(value.to_string()),
            });
        }
        self
    }

    /// Exact match on a reference column; the parameter must be a valid id
    pub fn equals_id(&mut self, column: &'static str, raw: Option<&str>) -> ApiResult<&mut Self> {
        if let Some(value) = non_empty(raw) {
            let id = parse_id(value)?;
            self.conditions.push(Condition::Equals {
                column,
                value: Value::Text(id.to_string()),
            });
        }
        Ok(self)
    }

    /// Inclusive numeric range; either side may be absent
    pub fn number_range(
        &mut self,
        column: &'static str,
        min: (&str, Option<&str>),
        max: (&str, Option<&str>),
    ) -> ApiResult<&mut Self> {
        if let Some(raw) = non_empty(min.1) {
            let value = parse_number(min.0, raw)?;
            self.conditions.push(Condition::AtLeast {
                column,
                value: Value::Real(value),
            });
        }
        if let Some(raw) = non_empty(max.1) {
            let value = parse_number(max.0, raw)?;
            self.conditions.push(Condition::AtMost {
                column,
                value: Value::Real(value),
            });
        }
        Ok(self)
    }

    /// Inclusive date range over a timestamp column
    pub fn date_range(
        &mut self,
        column: &'static str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> ApiResult<&mut Self> {
        if let Some(raw) = non_empty(from) {
            let ts = parse_date("from", raw)?;
            self.conditions.push(Condition::AtLeast {
                column,
                value: Value::Text(format_timestamp(&ts)),
            });
        }
        if let Some(raw) = non_empty(to) {
            let ts = parse_date("to", raw)?;
            self.conditions.push(Condition::AtMost {
                column,
                value: Value::Text(format_timestamp(&ts)),
            });
        }
        Ok(self)
    }

    /// Membership of an id in a JSON array column
    pub fn has_element(&mut self, column: &'static str, raw: Option<&str>) -> ApiResult<&mut Self> {
        if let Some(value) = non_empty(raw) {
            let id = parse_id(value)?;
            self.conditions.push(Condition::HasElement {
                column,
                value: id.to_string(),
            });
        }
        Ok(self)
    }

    /// Append ` WHERE ...` (nothing when there are no conditions)
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });

            match condition {
                Condition::Contains { needle } => {
                    qb.push("search_key LIKE ")
                        .push_bind(like_pattern(needle))
                        .push(" ESCAPE '\\'");
                }
                Condition::Equals { column, value } => {
                    qb.push(*column).push(" = ");
                    push_value(qb, value);
                }
                Condition::AtLeast { column, value } => {
                    qb.push(*column).push(" >= ");
                    push_value(qb, value);
                }
                Condition::AtMost { column, value } => {
                    qb.push(*column).push(" <= ");
                    push_value(qb, value);
                }
                Condition::HasElement { column, value } => {
                    qb.push("EXISTS (SELECT 1 FROM json_each(")
                        .push(*column)
                        .push(") WHERE json_each.value = ")
                        .push_bind(value.clone())
                        .push(")");
                }
            }
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Text(text) => {
            qb.push_bind(text.clone());
        }
        Value::Real(number) => {
            qb.push_bind(*number);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `asc`/`1` and `desc`/`-1`; anything else keeps `default`
    pub fn parse(raw: Option<&str>, default: SortDirection) -> SortDirection {
        match non_empty(raw).map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("desc") | Some("-1") => SortDirection::Desc,
            Some("asc") | Some("1") => SortDirection::Asc,
            _ => default,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Resolved ORDER BY clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    /// Map the `sort` parameter through `fields` (parameter name -> column)
    ///
    /// Unknown field names are rejected.
    pub fn resolve(
        fields: &[(&'static str, &'static str)],
        raw: Option<&str>,
        order: Option<&str>,
        default: Sort,
    ) -> ApiResult<Sort> {
        let column = match non_empty(raw) {
            None => default.column,
            Some(name) => fields
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, column)| *column)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid sort field: {}", name)))?,
        };

        Ok(Sort {
            column,
            direction: SortDirection::parse(order, default.direction),
        })
    }

    /// ` ORDER BY <column> <dir>, id ASC` (id keeps paging deterministic)
    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" ORDER BY ")
            .push(self.column)
            .push(" ")
            .push(self.direction.as_sql())
            .push(", id ASC");
    }
}
