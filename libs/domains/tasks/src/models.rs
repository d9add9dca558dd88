use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::FieldErrors;

/// Maximum title length in characters, counted after trimming
pub const TITLE_MAX_LEN: usize = 200;

/// Task lifecycle status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "task_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    /// Task still being worked on
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    /// Task finished
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl TaskStatus {
    /// Human-readable label for API responses
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Active => "Active",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// Parse a wire value (`active`/`completed`) into a status.
///
/// The error message names the allowed values so clients can correct
/// the request.
pub(crate) fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    raw.parse()
        .map_err(|_| "Invalid status. Allowed values: active, completed.".to_string())
}

/// Task entity - a titled item with a two-state lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// Unique identifier, assigned by the store, never reused
    pub id: i64,
    /// Task title (trimmed, never empty)
    pub title: String,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Full task representation returned by every read and mutation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    /// Human-readable status label
    pub status_display: String,
    pub is_active: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            status_display: task.status.display_name().to_string(),
            is_active: task.is_active(),
            is_completed: task.is_completed(),
            title: task.title,
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// DTO for creating a new task
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateTask {
    /// Task title (required, 1-200 characters after trimming)
    pub title: Option<String>,
    /// Initial status, defaults to `active` when omitted
    pub status: Option<String>,
}

/// Validated create payload, ready for the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
}

/// DTO for full and partial updates.
///
/// Both PUT and PATCH accept any subset of the fields; absent fields are
/// left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub status: Option<String>,
}

/// Validated update payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    /// Changes that only force the status (used by the complete/activate actions)
    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            title: None,
            status: Some(status),
        }
    }
}

/// Validate a raw title: trim surrounding whitespace, reject empty and
/// over-long values. The trimmed value is what gets persisted.
fn validate_title(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Title must not be empty.".to_string());
    }
    if trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(format!(
            "Title must be at most {} characters.",
            TITLE_MAX_LEN
        ));
    }
    Ok(trimmed.to_string())
}

impl CreateTask {
    /// Validate the create payload.
    ///
    /// Errors are collected per field; the store is never touched when any
    /// field fails.
    pub fn validated(self) -> Result<NewTask, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = match self.title.as_deref() {
            None => {
                errors.push("title", "This field is required.");
                None
            }
            Some(raw) => match validate_title(raw) {
                Ok(title) => Some(title),
                Err(message) => {
                    errors.push("title", message);
                    None
                }
            },
        };

        let status = match self.status.as_deref() {
            None => Some(TaskStatus::default()),
            Some(raw) => match parse_status(raw) {
                Ok(status) => Some(status),
                Err(message) => {
                    errors.push("status", message);
                    None
                }
            },
        };

        match (title, status) {
            (Some(title), Some(status)) if errors.is_empty() => Ok(NewTask { title, status }),
            _ => Err(errors),
        }
    }
}

impl UpdateTask {
    /// Validate the update payload.
    ///
    /// Present fields must pass the same checks as on create; absent fields
    /// stay unchanged.
    pub fn validated(self) -> Result<TaskChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = match self.title.as_deref() {
            None => None,
            Some(raw) => match validate_title(raw) {
                Ok(title) => Some(title),
                Err(message) => {
                    errors.push("title", message);
                    None
                }
            },
        };

        let status = match self.status.as_deref() {
            None => None,
            Some(raw) => match parse_status(raw) {
                Ok(status) => Some(status),
                Err(message) => {
                    errors.push("status", message);
                    None
                }
            },
        };

        if errors.is_empty() {
            Ok(TaskChanges { title, status })
        } else {
            Err(errors)
        }
    }
}
