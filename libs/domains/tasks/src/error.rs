use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(i64),

    #[error("Invalid page.")]
    InvalidPage,

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("JSON extraction error: {0}")]
    Json(#[from] JsonRejection),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TaskResult<T> = Result<T, TaskError>;

/// Convert TaskError to AppError for standardized error responses
impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(id) => AppError::NotFound(format!("Task {} not found", id)),
            TaskError::InvalidPage => AppError::NotFound("Invalid page.".to_string()),
            TaskError::Validation(errors) => AppError::Validation(
                serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null),
            ),
            TaskError::Json(rejection) => AppError::JsonExtractorRejection(rejection),
            TaskError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        // Convert to AppError for standardized error response format
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_accumulate() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.push("title", "Title must not be empty.");
        errors.push("title", "Second message");
        errors.push("status", "Invalid status.");

        assert_eq!(errors.get("title").unwrap().len(), 2);
        assert_eq!(errors.get("status").unwrap().len(), 1);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title must not be empty.");

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": ["Title must not be empty."]})
        );
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let response = TaskError::NotFound(42).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_page_maps_to_404() {
        let response = TaskError::InvalidPage.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title must not be empty.");

        let response = TaskError::Validation(errors).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
