use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use time::OffsetDateTime;

use crate::domain::error::FieldError;
use crate::domain::notification::{parse_timestamp, TimeOfDay};
use crate::domain::patch::Patch;

pub const NOTIFICATION_START_TIME: &str = "notification_start_time";
pub const NOTIFICATION_END_TIME: &str = "notification_end_time";
pub const PAUSED_UNTIL: &str = "paused_until";

/// Receipt channels: 1 WhatsApp, 2 SMS, 3 every channel.
pub const RECEIPT_TYPES: [i32; 3] = [1, 2, 3];

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone pattern compiles"));

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

/// Text used to echo a rejected value back in an error message.
fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

/// `notification_start_time` / `notification_end_time`. Null is accepted and
/// resolved to the field default by the merge.
pub fn time_of_day(field: &'static str, value: &Value) -> Result<Patch<TimeOfDay>, FieldError> {
    match value {
        Value::Null => Ok(Patch::Null),
        Value::String(raw) => TimeOfDay::parse(raw)
            .map(Patch::Present)
            .ok_or_else(|| FieldError::InvalidTimeFormat {
                field,
                value: describe(value),
            }),
        other => Err(FieldError::InvalidTimeFormat {
            field,
            value: describe(other),
        }),
    }
}

/// `paused_until`: an ISO 8601 date-time, or null to clear the pause.
pub fn paused_until(value: &Value) -> Result<Patch<OffsetDateTime>, FieldError> {
    match value {
        Value::Null => Ok(Patch::Null),
        Value::String(raw) => parse_timestamp(raw)
            .map(Patch::Present)
            .ok_or_else(|| FieldError::InvalidDateTimeFormat {
                field: PAUSED_UNTIL,
                value: describe(value),
            }),
        other => Err(FieldError::InvalidDateTimeFormat {
            field: PAUSED_UNTIL,
            value: describe(other),
        }),
    }
}

pub fn email(value: &Value) -> Result<Patch<String>, FieldError> {
    match value {
        Value::Null => Ok(Patch::Null),
        Value::String(raw) if EMAIL_PATTERN.is_match(raw) => Ok(Patch::Present(raw.clone())),
        Value::String(_) => Err(FieldError::invalid_value(
            "email",
            "must be a valid email address",
        )),
        _ => Err(FieldError::invalid_value("email", "must be a string or null")),
    }
}

pub fn phone(value: &Value) -> Result<Patch<String>, FieldError> {
    match value {
        Value::String(raw) if PHONE_PATTERN.is_match(raw) => Ok(Patch::Present(raw.clone())),
        Value::String(_) => Err(FieldError::invalid_value(
            "phone",
            "must match ^\\+?[1-9]\\d{1,14}$",
        )),
        Value::Null => Err(FieldError::invalid_value("phone", "cannot be null")),
        _ => Err(FieldError::invalid_value("phone", "must be a string")),
    }
}

pub fn receipt_type(value: &Value) -> Result<Patch<i32>, FieldError> {
    match value {
        Value::Null => Ok(Patch::Null),
        Value::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| RECEIPT_TYPES.contains(n))
            .map(Patch::Present)
            .ok_or_else(|| FieldError::invalid_value("receipt_type", "must be one of 1, 2, 3")),
        _ => Err(FieldError::invalid_value("receipt_type", "must be an integer")),
    }
}

pub fn active(value: &Value) -> Result<Patch<bool>, FieldError> {
    match value {
        Value::Bool(flag) => Ok(Patch::Present(*flag)),
        Value::Null => Err(FieldError::invalid_value("active", "cannot be null")),
        _ => Err(FieldError::invalid_value("active", "must be a boolean")),
    }
}

/// Collects field errors instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct ErrorBatch {
    errors: Vec<FieldError>,
}

impl ErrorBatch {
    /// Record the outcome of one field check. A rejected field stays `Absent`.
    pub fn check<T>(&mut self, outcome: Result<Patch<T>, FieldError>) -> Patch<T> {
        match outcome {
            Ok(patch) => patch,
            Err(err) => {
                self.errors.push(err);
                Patch::Absent
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}
