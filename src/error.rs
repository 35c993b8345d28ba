//! Domain-specific error types for diplom-ai

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One violated constraint on one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path into the request, e.g. `title.city` or `goals[1]`.
    pub field: String,
    pub constraint: String,
}

/// Every constraint violation found in a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub fields: Vec<FieldError>,
}

impl ValidationReport {
    pub fn push(&mut self, field: impl Into<String>, constraint: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            constraint: constraint.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any violation was recorded against `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// `Ok(())` when nothing was recorded, otherwise the report as an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DiplomError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.constraint))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Main error type for the diplom-ai service
#[derive(Error, Debug)]
pub enum DiplomError {
    #[error("Validation error: {0}")]
    Validation(ValidationReport),

    #[error("Malformed request body: {message}")]
    MalformedBody { message: String },

    #[error("Unrecognized profile: {token}")]
    UnrecognizedProfile { token: String },

    #[error("Document assembly error: {message}")]
    Assembly { message: String },

    #[error("Composer error: {message}")]
    Composer { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DiplomError {
    /// Single-field validation failure.
    pub fn invalid(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        let mut report = ValidationReport::default();
        report.push(field, constraint);
        DiplomError::Validation(report)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DiplomError::Validation(_) | DiplomError::UnrecognizedProfile { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DiplomError::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for DiplomError {
    fn from(err: anyhow::Error) -> Self {
        DiplomError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DiplomError {
    fn from(err: serde_json::Error) -> Self {
        DiplomError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for DiplomError {
    fn from(err: zip::result::ZipError) -> Self {
        DiplomError::Assembly {
            message: format!("zip container: {}", err),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for DiplomError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        DiplomError::MalformedBody {
            message: rejection.body_text(),
        }
    }
}

/// Convert DiplomError into the JSON error envelope
impl IntoResponse for DiplomError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        let fields = match &self {
            DiplomError::Validation(report) => report.fields.clone(),
            DiplomError::UnrecognizedProfile { token } => vec![FieldError {
                field: "profile".to_string(),
                constraint: format!("unknown profile '{}'", token),
            }],
            _ => Vec::new(),
        };

        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
                "fields": fields,
            }
        });

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

/// Result type alias for diplom-ai operations
pub type Result<T> = std::result::Result<T, DiplomError>;
