use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::app::merge::UserPatch;
use crate::domain::error::UpdateError;
use crate::domain::user::{Audit, ResourceKind, SearchCriterion, User};
use crate::infra::store::ResourceStore;

/// Read and partial-update operations for one endpoint family.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn ResourceStore>,
    kind: ResourceKind,
}

impl UserService {
    pub fn new(store: Arc<dyn ResourceStore>, kind: ResourceKind) -> Self {
        Self { store, kind }
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        self.store.fetch(self.kind, id).await
    }

    /// Validate `payload`, then merge it into the stored record and persist
    /// the result in one store operation. Nothing is written unless every
    /// touched field is accepted. An empty payload returns the current record
    /// without writing.
    pub async fn update(
        &self,
        id: i64,
        payload: &Map<String, Value>,
        audit: &Audit,
    ) -> Result<User, UpdateError> {
        let patch = UserPatch::from_json(payload)?;
        let not_found = || UpdateError::ResourceNotFound {
            kind: self.kind,
            id,
        };

        if patch.is_empty() {
            return self.store.fetch(self.kind, id).await?.ok_or_else(not_found);
        }

        let saved = self
            .store
            .update_with(self.kind, id, &|current: &User| patch.apply(current), audit)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(
            user_id = id,
            kind = %self.kind,
            actor_id = audit.actor_id,
            fields = ?patch.touched_fields(),
            "record updated"
        );

        Ok(saved)
    }

    pub async fn search(&self, criterion: &SearchCriterion) -> Result<Option<i64>> {
        self.store.find_by(criterion).await
    }
}
