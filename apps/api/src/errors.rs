use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::profile::errors::WorkflowError;
use crate::profile::models::SectionKind;
use crate::profile::validation::ValidationReport;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    BadRequest(String),

    #[error("Section validation failed: {}", .0.summary())]
    SectionInvalid(ValidationReport),

    #[error("Profile incomplete: {0:?}")]
    ProfileIncomplete(Vec<SectionKind>),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Persistence error: {0}")]
    Persistence(StoreError),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => AppError::NotFound(format!("User {id} not found")),
            other => AppError::Persistence(other),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::CannotProceed(report) => AppError::SectionInvalid(report),
            WorkflowError::ProfileIncomplete { missing_sections } => {
                AppError::ProfileIncomplete(missing_sections)
            }
            e @ WorkflowError::InvalidTransition { .. } => {
                AppError::InvalidTransition(e.to_string())
            }
            e @ WorkflowError::PayloadMismatch { .. } => AppError::BadRequest(e.to_string()),
            WorkflowError::Persistence(store) => store.into(),
            WorkflowError::Invariant(msg) => AppError::Invariant(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details): (StatusCode, &str, String, Option<Value>) =
            match &self {
                AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
                AppError::BadRequest(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
                }
                AppError::SectionInvalid(report) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    format!("{} is incomplete: {}", report.kind.title(), report.summary()),
                    Some(json!({
                        "section": report.kind,
                        "missingFields": report.missing_fields,
                    })),
                ),
                AppError::ProfileIncomplete(missing) => (
                    StatusCode::BAD_REQUEST,
                    "PROFILE_INCOMPLETE",
                    "Please complete all required sections".to_string(),
                    Some(json!({ "missingSections": missing })),
                ),
                AppError::InvalidTransition(msg) => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone(), None)
                }
                AppError::Unauthorized => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Authentication required".to_string(),
                    None,
                ),
                AppError::Persistence(e) if e.is_retryable() => {
                    tracing::error!("Persistence error: {e}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "PERSISTENCE_ERROR",
                        "Your changes could not be saved, please try again".to_string(),
                        None,
                    )
                }
                AppError::Persistence(e) => {
                    tracing::error!("Persistence error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "PERSISTENCE_ERROR",
                        "Stored profile data could not be read".to_string(),
                        None,
                    )
                }
                AppError::Invariant(msg) => {
                    tracing::error!("Invariant violated: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INVARIANT_VIOLATION",
                        "Profile state is inconsistent".to_string(),
                        None,
                    )
                }
                AppError::Internal(e) => {
                    tracing::error!("Internal error: {e:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                    )
                }
            };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }
        if let AppError::Persistence(e) = &self {
            error["retryable"] = Value::Bool(e.is_retryable());
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
