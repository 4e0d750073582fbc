use std::sync::Arc;

use anyhow::Result;

use crate::domain::contact::ContactLink;
use crate::domain::user::User;
use crate::infra::store::ResourceStore;

/// Relationship reads between clients, their contacts and attendants.
#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ResourceStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    pub async fn contacts_of_client(&self, client_id: i64) -> Result<Vec<User>> {
        self.store.contacts_of_client(client_id).await
    }

    pub async fn clients_of_contact(&self, contact_id: i64) -> Result<Vec<ContactLink>> {
        self.store.clients_of_contact(contact_id).await
    }

    /// Clients on any team the attendant belongs to.
    pub async fn clients_of_attendant(&self, attendant_id: i64) -> Result<Vec<User>> {
        self.store.clients_of_attendant(attendant_id).await
    }
}
