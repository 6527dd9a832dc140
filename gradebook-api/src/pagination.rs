//! Pagination utilities
//!
//! Page and limit arrive as raw query strings and are coerced rather than
//! rejected: anything unusable falls back to the default.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Pagination parameters after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Page size, within [1, MAX_LIMIT]
    pub limit: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub skip: i64,
}

/// Leading integer of a query parameter, the way `parseInt` reads it
///
/// `"3"` -> 3, `" 2.7"` -> 2, `"12abc"` -> 12, `"-5"` -> -5, `"abc"` -> None
pub fn coerce_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    s[..end].parse().ok()
}

/// Clamp raw page/limit parameters and compute the offset
///
/// # Examples
/// ```
/// use gradebook_api::pagination::calculate_pagination;
///
/// let p = calculate_pagination(Some("3"), Some("20"));
/// assert_eq!((p.page, p.limit, p.skip), (3, 20, 40));
///
/// // Out-of-range input is clamped, never rejected
/// let p = calculate_pagination(Some("-5"), Some("500"));
/// assert_eq!((p.page, p.limit), (1, 100));
/// ```
pub fn calculate_pagination(page: Option<&str>, limit: Option<&str>) -> Pagination {
    let page = coerce_int(page).unwrap_or(DEFAULT_PAGE).max(1);
    let limit = coerce_int(limit).unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let skip = (page - 1).saturating_mul(limit);

    Pagination { page, limit, skip }
}

/// Number of pages needed for `total` items
pub fn page_count(total: i64, limit: i64) -> i64 {
    let limit = limit.max(1);
    (total + limit - 1) / limit
}

/// Paged result envelope
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub page: i64,
    pub limit: i64,
    /// Items matching the filters, regardless of paging
    pub total: i64,
    pub pages: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(pagination: Pagination, total: i64, items: Vec<T>) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            pages: page_count(total, pagination.limit),
            items,
        }
    }
}
