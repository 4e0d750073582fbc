use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::domain::contact::ContactLink;
use crate::domain::user::User;

/// How a null field is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    AlwaysInclude,
    OmitIfNull,
}

/// Declared output shape of one endpoint: a default null policy plus
/// per-field overrides.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub default: NullPolicy,
    pub overrides: &'static [(&'static str, NullPolicy)],
}

impl Projection {
    /// Every field, nulls written as `null`.
    pub const INCLUDE_NULLS: Projection = Projection {
        default: NullPolicy::AlwaysInclude,
        overrides: &[],
    };

    /// Null fields dropped from the body.
    pub const OMIT_NULLS: Projection = Projection {
        default: NullPolicy::OmitIfNull,
        overrides: &[],
    };

    pub fn policy_for(&self, field: &str) -> NullPolicy {
        self.overrides
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, policy)| *policy)
            .unwrap_or(self.default)
    }

    pub fn user(&self, user: &User) -> serde_json::Result<Value> {
        match serde_json::to_value(user)? {
            Value::Object(fields) => Ok(Value::Object(self.shape(fields))),
            other => Ok(other),
        }
    }

    pub fn users(&self, users: &[User]) -> serde_json::Result<Value> {
        users
            .iter()
            .map(|user| self.user(user))
            .collect::<serde_json::Result<Vec<_>>>()
            .map(Value::Array)
    }

    /// The nested client follows this projection; association timestamps
    /// are passed through as stored.
    pub fn contact_link(&self, link: &ContactLink) -> serde_json::Result<Value> {
        let mut body = Map::new();
        body.insert("user_id".into(), Value::from(link.client_id));
        body.insert("user".into(), self.user(&link.client)?);
        body.insert("created_at".into(), timestamp(&link.created_at)?);
        body.insert("updated_at".into(), timestamp(&link.updated_at)?);
        Ok(Value::Object(body))
    }

    fn shape(&self, fields: Map<String, Value>) -> Map<String, Value> {
        fields
            .into_iter()
            .filter(|(name, value)| {
                !(value.is_null() && self.policy_for(name) == NullPolicy::OmitIfNull)
            })
            .collect()
    }
}

fn timestamp(at: &Option<OffsetDateTime>) -> serde_json::Result<Value> {
    time::serde::rfc3339::option::serialize(at, serde_json::value::Serializer)
}
