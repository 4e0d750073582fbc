use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::error::{FieldError, UpdateError};

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    detail: Value,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: Value,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: Value::String(message.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: Value::String(message.into()),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: Value::String(message.into()),
        }
    }

    /// 422 with one `{loc, msg, type}` entry per rejected field.
    pub fn invalid_fields(errors: &[FieldError]) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: Value::Array(errors.iter().map(field_entry).collect()),
        }
    }

    /// 400 naming every key that may not be updated, followed by any other
    /// rejected fields of the same payload.
    pub fn forbidden_fields(fields: &[String], errors: &[FieldError]) -> Self {
        let forbidden = fields.iter().map(|field| {
            json!({
                "loc": ["body", field],
                "msg": format!("this change is not authorized: {}", field),
                "type": "forbidden_field",
            })
        });
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: Value::Array(forbidden.chain(errors.iter().map(field_entry)).collect()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: Value::String(message.into()),
        }
    }
}

impl From<UpdateError> for AppError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::ForbiddenFieldUpdate { fields, invalid } => {
                let rejected: Vec<&str> = invalid.iter().map(FieldError::field).collect();
                tracing::warn!(
                    fields = ?fields,
                    invalid = ?rejected,
                    "rejected update of forbidden fields"
                );
                AppError::forbidden_fields(&fields, &invalid)
            }
            UpdateError::ResourceNotFound { .. } => AppError::not_found(err.to_string()),
            UpdateError::Store(err) => {
                tracing::error!(error = ?err, "failed to update record");
                AppError::internal("failed to update record")
            }
            UpdateError::Field(_) | UpdateError::ValidationBatchFailure(_) => {
                let errors = err.field_errors();
                let fields: Vec<&str> = errors.iter().map(FieldError::field).collect();
                tracing::warn!(fields = ?fields, "rejected update with invalid fields");
                AppError::invalid_fields(errors)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::unprocessable(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            detail: self.detail,
        });
        (self.status, body).into_response()
    }
}

fn field_entry(err: &FieldError) -> Value {
    json!({
        "loc": ["body", err.field()],
        "msg": err.to_string(),
        "type": err.code(),
    })
}
