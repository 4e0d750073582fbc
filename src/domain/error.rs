use thiserror::Error;

use crate::domain::user::ResourceKind;

/// A single rejected field of an update payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} must be a time in HH:MM format between 00:00 and 23:59, got {value}")]
    InvalidTimeFormat { field: &'static str, value: String },

    #[error("{field} must be an ISO 8601 datetime or null, got {value}")]
    InvalidDateTimeFormat { field: &'static str, value: String },

    #[error("{field} {reason}")]
    InvalidFieldValue { field: &'static str, reason: String },
}

impl FieldError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidTimeFormat { field, .. }
            | Self::InvalidDateTimeFormat { field, .. }
            | Self::InvalidFieldValue { field, .. } => field,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimeFormat { .. } => "invalid_time_format",
            Self::InvalidDateTimeFormat { .. } => "invalid_datetime_format",
            Self::InvalidFieldValue { .. } => "invalid_value",
        }
    }
}

/// Why a partial update was refused.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The payload names keys that cannot be updated. Field errors found in
    /// the rest of the payload ride along in `invalid`.
    #[error("this change is not authorized: {}", fields.join(", "))]
    ForbiddenFieldUpdate {
        fields: Vec<String>,
        invalid: Vec<FieldError>,
    },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("{kind} not found.")]
    ResourceNotFound { kind: ResourceKind, id: i64 },

    #[error("{} fields failed validation", .0.len())]
    ValidationBatchFailure(Vec<FieldError>),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl UpdateError {
    /// One error keeps its own kind; several become a batch.
    pub fn from_field_errors(mut errors: Vec<FieldError>) -> Self {
        if errors.len() == 1 {
            Self::Field(errors.remove(0))
        } else {
            Self::ValidationBatchFailure(errors)
        }
    }

    /// The field-level errors carried by this error.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Field(error) => std::slice::from_ref(error),
            Self::ValidationBatchFailure(errors) => errors,
            Self::ForbiddenFieldUpdate { invalid, .. } => invalid,
            Self::ResourceNotFound { .. } | Self::Store(_) => &[],
        }
    }
}
