use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::domain::contact::ContactLink;
use crate::domain::notification::{
    TimeOfDay, DEFAULT_NOTIFICATION_END, DEFAULT_NOTIFICATION_START,
};
use crate::domain::user::{Audit, ResourceKind, SearchCriterion, User};
use crate::infra::db::Db;

/// Persistence operations the update and read paths need.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    /// Load a record. `ResourceKind::Attendant` only matches attendants.
    async fn fetch(&self, kind: ResourceKind, id: i64) -> Result<Option<User>>;

    /// Load the record under a write lock, pass it through `apply`, and store
    /// the result with the audit stamp. Returns the stored row, or `None` if
    /// no record of `kind` has this id. Concurrent updates of the same record
    /// are serialized so each one merges into the latest state.
    async fn update_with(
        &self,
        kind: ResourceKind,
        id: i64,
        apply: &(dyn for<'u> Fn(&'u User) -> User + Sync),
        audit: &Audit,
    ) -> Result<Option<User>>;

    async fn find_by(&self, criterion: &SearchCriterion) -> Result<Option<i64>>;

    async fn contacts_of_client(&self, client_id: i64) -> Result<Vec<User>>;

    async fn clients_of_contact(&self, contact_id: i64) -> Result<Vec<ContactLink>>;

    async fn clients_of_attendant(&self, attendant_id: i64) -> Result<Vec<User>>;
}

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.phone, u.receipt_type, u.role, u.active, \
     u.notification_start_time, u.notification_end_time, u.paused_until";

#[derive(Clone)]
pub struct PgStore {
    db: Db,
    schema: String,
}

impl PgStore {
    /// `schema` must already be a validated identifier.
    pub fn new(db: Db, schema: impl Into<String>) -> Self {
        Self {
            db,
            schema: schema.into(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}.{}", self.schema, name)
    }

    fn select_sql(&self, kind: ResourceKind) -> String {
        match kind {
            ResourceKind::User => format!(
                "SELECT {USER_COLUMNS} FROM {} u WHERE u.id = $1",
                self.table("users")
            ),
            ResourceKind::Attendant => format!(
                "SELECT {USER_COLUMNS} FROM {} u \
                 JOIN {} a ON a.user_id = u.id \
                 WHERE u.id = $1 AND u.role = 'attendant'",
                self.table("users"),
                self.table("attendants")
            ),
        }
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }

    async fn fetch(&self, kind: ResourceKind, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&self.select_sql(kind))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_with(
        &self,
        kind: ResourceKind,
        id: i64,
        apply: &(dyn for<'u> Fn(&'u User) -> User + Sync),
        audit: &Audit,
    ) -> Result<Option<User>> {
        let mut tx = self.db.pool().begin().await?;

        let current = sqlx::query(&format!("{} FOR UPDATE OF u", self.select_sql(kind)))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };
        let user = apply(&user_from_row(&current)?);

        let sql = format!(
            "UPDATE {} u \
             SET email = $2, \
                 phone = $3, \
                 receipt_type = $4, \
                 active = $5, \
                 notification_start_time = $6, \
                 notification_end_time = $7, \
                 paused_until = $8, \
                 updated_by = $9, \
                 user_ip = $10, \
                 updated_at = now() \
             WHERE u.id = $1 \
             RETURNING {USER_COLUMNS}",
            self.table("users")
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.receipt_type)
            .bind(user.active)
            .bind(user.notification_start_time.to_string())
            .bind(user.notification_end_time.to_string())
            .bind(user.paused_until.map(to_utc_primitive))
            .bind(audit.actor_id)
            .bind(&audit.ip)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        user_from_row(&row).map(Some)
    }
    async fn find_by(&self, criterion: &SearchCriterion) -> Result<Option<i64>> {
        let (sql, value) = match criterion {
            SearchCriterion::Email(email) => (
                format!("SELECT u.id FROM {} u WHERE u.email = $1", self.table("users")),
                email,
            ),
            SearchCriterion::Phone(phone) => (
                format!("SELECT u.id FROM {} u WHERE u.phone = $1", self.table("users")),
                phone,
            ),
            SearchCriterion::Cpf(cpf) => (
                format!(
                    "SELECT u.id FROM {} u JOIN {} c ON c.user_id = u.id WHERE c.cpf = $1",
                    self.table("users"),
                    self.table("clients")
                ),
                cpf,
            ),
        };

        let id = sqlx::query_scalar::<_, i64>(&format!("{sql} ORDER BY u.id LIMIT 1"))
            .bind(value)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(id)
    }

    async fn contacts_of_client(&self, client_id: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM {} u \
             JOIN {} c ON c.user_contact_id = u.id \
             WHERE c.user_client_id = $1 \
             ORDER BY u.id",
            self.table("users"),
            self.table("contacts")
        );

        let rows = sqlx::query(&sql)
            .bind(client_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn clients_of_contact(&self, contact_id: i64) -> Result<Vec<ContactLink>> {
        let sql = format!(
            "SELECT c.user_client_id, c.created_at AS link_created_at, \
                    c.updated_at AS link_updated_at, {USER_COLUMNS} \
             FROM {} c \
             JOIN {} u ON u.id = c.user_client_id \
             WHERE c.user_contact_id = $1 \
             ORDER BY c.user_client_id",
            self.table("contacts"),
            self.table("users")
        );

        let rows = sqlx::query(&sql)
            .bind(contact_id)
            .fetch_all(self.db.pool())
            .await?;

        let mut links = Vec::with_capacity(rows.len());
        for row in &rows {
            links.push(ContactLink {
                client_id: row.try_get("user_client_id")?,
                client: user_from_row(row)?,
                created_at: row
                    .try_get::<Option<PrimitiveDateTime>, _>("link_created_at")?
                    .map(PrimitiveDateTime::assume_utc),
                updated_at: row
                    .try_get::<Option<PrimitiveDateTime>, _>("link_updated_at")?
                    .map(PrimitiveDateTime::assume_utc),
            });
        }

        Ok(links)
    }

    async fn clients_of_attendant(&self, attendant_id: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT DISTINCT {USER_COLUMNS} FROM {} tm \
             JOIN {} cl ON cl.team_id = tm.team_id \
             JOIN {} u ON u.id = cl.user_id \
             WHERE tm.attendant_id = $1 \
             ORDER BY u.id",
            self.table("attendant_team"),
            self.table("clients"),
            self.table("users")
        );

        let rows = sqlx::query(&sql)
            .bind(attendant_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(user_from_row).collect()
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let id: i64 = row.try_get("id")?;
    let role: String = row.try_get("role")?;

    Ok(User {
        id,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        receipt_type: row.try_get("receipt_type")?,
        role: role.parse().with_context(|| format!("user {id}"))?,
        active: row.try_get::<Option<bool>, _>("active")?.unwrap_or(false),
        notification_start_time: stored_time(
            row.try_get("notification_start_time")?,
            DEFAULT_NOTIFICATION_START,
        )
        .with_context(|| format!("user {id}"))?,
        notification_end_time: stored_time(
            row.try_get("notification_end_time")?,
            DEFAULT_NOTIFICATION_END,
        )
        .with_context(|| format!("user {id}"))?,
        paused_until: row
            .try_get::<Option<PrimitiveDateTime>, _>("paused_until")?
            .map(PrimitiveDateTime::assume_utc),
    })
}

/// Rows written before the window columns existed may hold NULL.
fn stored_time(raw: Option<String>, default: TimeOfDay) -> Result<TimeOfDay> {
    match raw {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(default),
    }
}

/// `paused_until` is stored as a UTC timestamp without zone.
fn to_utc_primitive(at: OffsetDateTime) -> PrimitiveDateTime {
    let at = at.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(at.date(), at.time())
}
