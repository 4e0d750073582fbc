use time::OffsetDateTime;

use crate::domain::user::User;

/// A client reached through a contact association, with the association's
/// own timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLink {
    pub client_id: i64,
    pub client: User,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}
