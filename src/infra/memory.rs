use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;

use crate::domain::contact::ContactLink;
use crate::domain::user::{Audit, ResourceKind, Role, SearchCriterion, User};
use crate::infra::store::ResourceStore;

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    last_audit: Option<Audit>,
    writes: usize,
}

#[derive(Debug, Clone)]
struct ClientProfile {
    cpf: String,
    team_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct ContactRow {
    client_id: i64,
    contact_id: i64,
    created_at: Option<OffsetDateTime>,
    updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, StoredUser>,
    attendants: BTreeSet<i64>,
    clients: BTreeMap<i64, ClientProfile>,
    contacts: Vec<ContactRow>,
    attendant_teams: BTreeSet<(i64, i64)>,
}

impl Tables {
    /// The row behind `id` if it is reachable as `kind`.
    fn visible(&self, kind: ResourceKind, id: i64) -> Option<&StoredUser> {
        self.users.get(&id).filter(|row| match kind {
            ResourceKind::User => true,
            ResourceKind::Attendant => {
                row.user.role == Role::Attendant && self.attendants.contains(&id)
            }
        })
    }
}

/// Process-local store with the same visibility rules as the Postgres one.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        let mut tables = self.tables.write();
        tables.users.insert(
            user.id,
            StoredUser {
                user,
                last_audit: None,
                writes: 0,
            },
        );
    }

    /// Give an attendant-role user its attendant profile.
    pub fn insert_attendant_profile(&self, user_id: i64) {
        self.tables.write().attendants.insert(user_id);
    }

    pub fn insert_client_profile(&self, user_id: i64, cpf: impl Into<String>, team_id: Option<i64>) {
        self.tables.write().clients.insert(
            user_id,
            ClientProfile {
                cpf: cpf.into(),
                team_id,
            },
        );
    }

    pub fn link_contact(
        &self,
        client_id: i64,
        contact_id: i64,
        created_at: Option<OffsetDateTime>,
        updated_at: Option<OffsetDateTime>,
    ) {
        self.tables.write().contacts.push(ContactRow {
            client_id,
            contact_id,
            created_at,
            updated_at,
        });
    }

    pub fn assign_team(&self, attendant_id: i64, team_id: i64) {
        self.tables
            .write()
            .attendant_teams
            .insert((attendant_id, team_id));
    }

    /// Current stored state, bypassing endpoint visibility rules.
    pub fn snapshot(&self, id: i64) -> Option<User> {
        self.tables.read().users.get(&id).map(|row| row.user.clone())
    }

    pub fn last_audit(&self, id: i64) -> Option<Audit> {
        self.tables
            .read()
            .users
            .get(&id)
            .and_then(|row| row.last_audit.clone())
    }

    /// Number of successful saves against `id`.
    pub fn write_count(&self, id: i64) -> usize {
        self.tables
            .read()
            .users
            .get(&id)
            .map_or(0, |row| row.writes)
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, kind: ResourceKind, id: i64) -> Result<Option<User>> {
        let tables = self.tables.read();
        Ok(tables.visible(kind, id).map(|row| row.user.clone()))
    }

    async fn update_with(
        &self,
        kind: ResourceKind,
        id: i64,
        apply: &(dyn for<'u> Fn(&'u User) -> User + Sync),
        audit: &Audit,
    ) -> Result<Option<User>> {
        let mut tables = self.tables.write();
        if tables.visible(kind, id).is_none() {
            return Ok(None);
        }
        let Some(row) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        let merged = apply(&row.user);
        row.user = User {
            id: row.user.id,
            name: row.user.name.clone(),
            role: row.user.role,
            ..merged
        };
        row.last_audit = Some(audit.clone());
        row.writes += 1;

        Ok(Some(row.user.clone()))
    }

    async fn find_by(&self, criterion: &SearchCriterion) -> Result<Option<i64>> {
        let tables = self.tables.read();
        let found = match criterion {
            SearchCriterion::Email(email) => tables
                .users
                .values()
                .find(|row| row.user.email.as_deref() == Some(email.as_str()))
                .map(|row| row.user.id),
            SearchCriterion::Phone(phone) => tables
                .users
                .values()
                .find(|row| &row.user.phone == phone)
                .map(|row| row.user.id),
            SearchCriterion::Cpf(cpf) => tables
                .clients
                .iter()
                .find(|(id, profile)| &profile.cpf == cpf && tables.users.contains_key(*id))
                .map(|(id, _)| *id),
        };
        Ok(found)
    }

    async fn contacts_of_client(&self, client_id: i64) -> Result<Vec<User>> {
        let tables = self.tables.read();
        let ids: BTreeSet<i64> = tables
            .contacts
            .iter()
            .filter(|link| link.client_id == client_id)
            .map(|link| link.contact_id)
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id))
            .map(|row| row.user.clone())
            .collect())
    }

    async fn clients_of_contact(&self, contact_id: i64) -> Result<Vec<ContactLink>> {
        let tables = self.tables.read();
        let mut links: Vec<ContactLink> = tables
            .contacts
            .iter()
            .filter(|link| link.contact_id == contact_id)
            .filter_map(|link| {
                tables.users.get(&link.client_id).map(|row| ContactLink {
                    client_id: link.client_id,
                    client: row.user.clone(),
                    created_at: link.created_at,
                    updated_at: link.updated_at,
                })
            })
            .collect();
        links.sort_by_key(|link| link.client_id);
        Ok(links)
    }

    async fn clients_of_attendant(&self, attendant_id: i64) -> Result<Vec<User>> {
        let tables = self.tables.read();
        let teams: BTreeSet<i64> = tables
            .attendant_teams
            .iter()
            .filter(|(attendant, _)| *attendant == attendant_id)
            .map(|(_, team)| *team)
            .collect();

        Ok(tables
            .clients
            .iter()
            .filter(|(_, profile)| profile.team_id.is_some_and(|team| teams.contains(&team)))
            .filter_map(|(id, _)| tables.users.get(id))
            .map(|row| row.user.clone())
            .collect())
    }
}
