use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{FieldErrors, TaskError};
use crate::models::{parse_status, TaskStatus};

/// Fields a task listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    UpdatedAt,
    Title,
    Status,
}

/// A parsed `ordering` query value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for Ordering {
    /// Newest first
    fn default() -> Self {
        Self {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl Ordering {
    /// Parse an `ordering` value (`title`, `-updated_at`, ...).
    ///
    /// Unrecognized values fall back to the default `-created_at`.
    pub fn parse(raw: &str) -> Self {
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let field = match name {
            "created_at" => Some(OrderField::CreatedAt),
            "updated_at" => Some(OrderField::UpdatedAt),
            "title" => Some(OrderField::Title),
            "status" => Some(OrderField::Status),
            _ => None,
        };

        match field {
            Some(field) => Self { field, descending },
            None => Self::default(),
        }
    }
}

/// Raw query parameters accepted by the list endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListTasksQuery {
    /// Filter by exact status (`active` or `completed`)
    pub status: Option<String>,
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
    /// Tasks created at or after this timestamp (inclusive)
    pub created_after: Option<String>,
    /// Tasks created at or before this timestamp (inclusive)
    pub created_before: Option<String>,
    /// Case-insensitive search against the title
    pub search: Option<String>,
    /// Sort field, `-`-prefixed for descending (default `-created_at`)
    pub ordering: Option<String>,
    /// Page number (fixed page size)
    pub page: Option<String>,
}

/// Validated filter set applied to task listings.
///
/// All supplied conditions combine with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub title: Option<String>,
    pub search: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub ordering: Ordering,
}

impl TaskFilter {
    /// Filter restricted to one status, everything else at defaults
    pub fn for_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Validate raw query parameters into a filter.
    ///
    /// Invalid `status` and timestamp values are rejected with per-field
    /// errors; unrecognized `ordering` values fall back to the default.
    pub fn from_query(query: &ListTasksQuery) -> Result<Self, TaskError> {
        let mut errors = FieldErrors::new();

        let status = match query.status.as_deref() {
            None => None,
            Some(raw) => match parse_status(raw) {
                Ok(status) => Some(status),
                Err(message) => {
                    errors.push("status", message);
                    None
                }
            },
        };

        let created_after = match query.created_after.as_deref() {
            None => None,
            Some(raw) => match parse_datetime(raw) {
                Ok(bound) => Some(bound),
                Err(message) => {
                    errors.push("created_after", message);
                    None
                }
            },
        };

        let created_before = match query.created_before.as_deref() {
            None => None,
            Some(raw) => match parse_datetime(raw) {
                Ok(bound) => Some(bound),
                Err(message) => {
                    errors.push("created_before", message);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(TaskError::Validation(errors));
        }

        let ordering = query
            .ordering
            .as_deref()
            .map(Ordering::parse)
            .unwrap_or_default();

        Ok(Self {
            status,
            title: query.title.clone(),
            search: query.search.clone(),
            created_after,
            created_before,
            ordering,
        })
    }
}

/// Parse a timestamp query value.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, or a bare date (midnight UTC).
fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(parsed.and_time(NaiveTime::MIN).and_utc());
    }
    Err("Enter a valid date/time.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse_known_fields() {
        let ordering = Ordering::parse("title");
        assert_eq!(ordering.field, OrderField::Title);
        assert!(!ordering.descending);

        let ordering = Ordering::parse("-updated_at");
        assert_eq!(ordering.field, OrderField::UpdatedAt);
        assert!(ordering.descending);
    }

    #[test]
    fn test_ordering_parse_unknown_falls_back_to_default() {
        let ordering = Ordering::parse("priority");
        assert_eq!(ordering, Ordering::default());

        let ordering = Ordering::parse("-nonsense");
        assert_eq!(ordering, Ordering::default());
    }

    #[test]
    fn test_filter_from_empty_query() {
        let filter = TaskFilter::from_query(&ListTasksQuery::default()).unwrap();
        assert_eq!(filter, TaskFilter::default());
        assert!(filter.ordering.descending);
        assert_eq!(filter.ordering.field, OrderField::CreatedAt);
    }

    #[test]
    fn test_filter_parses_status() {
        let query = ListTasksQuery {
            status: Some("completed".to_string()),
            ..Default::default()
        };

        let filter = TaskFilter::from_query(&query).unwrap();
        assert_eq!(filter.status, Some(TaskStatus::Completed));
    }

    #[test]
    fn test_filter_rejects_invalid_status() {
        let query = ListTasksQuery {
            status: Some("archived".to_string()),
            ..Default::default()
        };

        let err = TaskFilter::from_query(&query).unwrap_err();
        match err {
            TaskError::Validation(errors) => {
                assert!(errors.get("status").unwrap()[0].contains("active, completed"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_rejects_invalid_timestamp() {
        let query = ListTasksQuery {
            created_after: Some("not-a-date".to_string()),
            ..Default::default()
        };

        let err = TaskFilter::from_query(&query).unwrap_err();
        match err {
            TaskError::Validation(errors) => {
                assert!(errors.get("created_after").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2025-03-01T12:30:00Z").is_ok());
        assert!(parse_datetime("2025-03-01T12:30:00+02:00").is_ok());
        assert!(parse_datetime("2025-03-01 12:30:00").is_ok());
        assert!(parse_datetime("2025-03-01").is_ok());
        assert!(parse_datetime("March 1st").is_err());
    }

    #[test]
    fn test_bare_date_means_midnight_utc() {
        let parsed = parse_datetime("2025-03-01").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }
}
