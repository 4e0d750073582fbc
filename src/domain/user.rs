use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::notification::{NotificationWindow, TimeOfDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Contact,
    Subscriber,
    Assisted,
    Attendant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Contact => "contact",
            Role::Subscriber => "subscriber",
            Role::Assisted => "assisted",
            Role::Attendant => "attendant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(Role::Contact),
            "subscriber" => Ok(Role::Subscriber),
            "assisted" => Ok(Role::Assisted),
            "attendant" => Ok(Role::Attendant),
            other => Err(anyhow::anyhow!("unknown role: {}", other)),
        }
    }
}

/// Which endpoint family a record is addressed through. Attendants are users
/// with the attendant role and an attendant profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Attendant,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::User => "User",
            ResourceKind::Attendant => "Attendant",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub receipt_type: Option<i32>,
    pub role: Role,
    pub active: bool,
    pub notification_start_time: TimeOfDay,
    pub notification_end_time: TimeOfDay,
    #[serde(with = "time::serde::rfc3339::option")]
    pub paused_until: Option<OffsetDateTime>,
}

impl User {
    pub fn notification_window(&self) -> NotificationWindow {
        NotificationWindow {
            start: self.notification_start_time,
            end: self.notification_end_time,
            paused_until: self.paused_until,
        }
    }
}

/// Who performed a write and from where; stamped on every saved update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audit {
    pub actor_id: i64,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriterion {
    Email(String),
    Phone(String),
    Cpf(String),
}
