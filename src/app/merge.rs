use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::app::validation::{self, ErrorBatch};
use crate::domain::error::{FieldError, UpdateError};
use crate::domain::notification::{
    TimeOfDay, DEFAULT_NOTIFICATION_END, DEFAULT_NOTIFICATION_START,
};
use crate::domain::patch::Patch;
use crate::domain::user::User;

/// Keys a partial update may carry. Anything else is rejected.
pub const UPDATABLE_FIELDS: [&str; 7] = [
    "email",
    "phone",
    "receipt_type",
    "active",
    validation::NOTIFICATION_START_TIME,
    validation::NOTIFICATION_END_TIME,
    validation::PAUSED_UNTIL,
];

/// A validated sparse update for a user or attendant record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Patch<String>,
    pub phone: Patch<String>,
    pub receipt_type: Patch<i32>,
    pub active: Patch<bool>,
    pub notification_start_time: Patch<TimeOfDay>,
    pub notification_end_time: Patch<TimeOfDay>,
    pub paused_until: Patch<OffsetDateTime>,
}

impl UserPatch {
    /// Classify and validate a raw JSON payload.
    ///
    /// Keys outside [`UPDATABLE_FIELDS`] fail the whole payload with
    /// `ForbiddenFieldUpdate`. The updatable keys are still checked so every
    /// rejected field is reported in one response.
    pub fn from_json(payload: &Map<String, Value>) -> Result<Self, UpdateError> {
        let forbidden: Vec<String> = payload
            .keys()
            .filter(|key| !UPDATABLE_FIELDS.contains(&key.as_str()))
            .cloned()
            .collect();

        let mut batch = ErrorBatch::default();
        let patch = UserPatch {
            email: field(payload, "email", &mut batch, validation::email),
            phone: field(payload, "phone", &mut batch, validation::phone),
            receipt_type: field(payload, "receipt_type", &mut batch, validation::receipt_type),
            active: field(payload, "active", &mut batch, validation::active),
            notification_start_time: field(
                payload,
                validation::NOTIFICATION_START_TIME,
                &mut batch,
                |v| validation::time_of_day(validation::NOTIFICATION_START_TIME, v),
            ),
            notification_end_time: field(
                payload,
                validation::NOTIFICATION_END_TIME,
                &mut batch,
                |v| validation::time_of_day(validation::NOTIFICATION_END_TIME, v),
            ),
            paused_until: field(
                payload,
                validation::PAUSED_UNTIL,
                &mut batch,
                validation::paused_until,
            ),
        };

        if !forbidden.is_empty() {
            Err(UpdateError::ForbiddenFieldUpdate {
                fields: forbidden,
                invalid: batch.into_errors(),
            })
        } else if batch.is_empty() {
            Ok(patch)
        } else {
            Err(UpdateError::from_field_errors(batch.into_errors()))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.touched_fields().is_empty()
    }

    /// Names of the fields this patch touches, in declaration order.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let touched = [
            self.email.is_touched(),
            self.phone.is_touched(),
            self.receipt_type.is_touched(),
            self.active.is_touched(),
            self.notification_start_time.is_touched(),
            self.notification_end_time.is_touched(),
            self.paused_until.is_touched(),
        ];
        UPDATABLE_FIELDS
            .iter()
            .zip(touched)
            .filter_map(|(name, touched)| touched.then_some(*name))
            .collect()
    }

    /// Produce the merged record. Untouched fields keep their current value.
    pub fn apply(&self, current: &User) -> User {
        User {
            id: current.id,
            name: current.name.clone(),
            email: self.email.merge_optional(&current.email),
            phone: self
                .phone
                .merge_required(&current.phone, || current.phone.clone()),
            receipt_type: self.receipt_type.merge_optional(&current.receipt_type),
            role: current.role,
            active: self.active.merge_required(&current.active, || current.active),
            notification_start_time: self
                .notification_start_time
                .merge_required(&current.notification_start_time, || {
                    DEFAULT_NOTIFICATION_START
                }),
            notification_end_time: self
                .notification_end_time
                .merge_required(&current.notification_end_time, || DEFAULT_NOTIFICATION_END),
            paused_until: self.paused_until.merge_optional(&current.paused_until),
        }
    }
}

fn field<T>(
    payload: &Map<String, Value>,
    name: &'static str,
    batch: &mut ErrorBatch,
    check: impl FnOnce(&Value) -> Result<Patch<T>, FieldError>,
) -> Patch<T> {
    match payload.get(name) {
        Some(value) => batch.check(check(value)),
        None => Patch::Absent,
    }
}

/// Validate `payload` and merge it into `current` in one step.
pub fn merge(current: &User, payload: &Map<String, Value>) -> Result<User, UpdateError> {
    let patch = UserPatch::from_json(payload)?;
    Ok(patch.apply(current))
}
