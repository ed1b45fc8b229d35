//! In-memory identity store.
//!
//! Records are lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{EMAIL_UNIQUE_CONSTRAINT, IdentityStore};
use crate::{
    db::{
        errors::{DbError, Result},
        models::identities::{IdentityCreateDBRequest, IdentityDBResponse},
    },
    types::{IdentityId, abbrev_uuid, normalize_email},
};

#[derive(Clone, Default)]
pub struct InMemoryIdentities {
    records: Arc<DashMap<IdentityId, IdentityDBResponse>>,
    emails: Arc<DashMap<String, IdentityId>>,
}

impl InMemoryIdentities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentities {
    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityDBResponse>> {
        let email = normalize_email(email);
        let Some(id) = self.emails.get(&email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self), fields(identity_id = %abbrev_uuid(&id)), err)]
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<IdentityDBResponse>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self, request), err)]
    async fn create(&self, request: &IdentityCreateDBRequest) -> Result<IdentityDBResponse> {
        let email = normalize_email(&request.email);

        // The email entry stays locked until the record is in place, so two concurrent creates
        // for one email cannot both pass the vacancy check.
        match self.emails.entry(email.clone()) {
            Entry::Occupied(_) => Err(DbError::unique_violation("identities", EMAIL_UNIQUE_CONSTRAINT)),
            Entry::Vacant(slot) => {
                let record = IdentityDBResponse {
                    id: Uuid::new_v4(),
                    email,
                    password_hash: request.password_hash.clone(),
                    created_at: Utc::now(),
                };
                self.records.insert(record.id, record.clone());
                slot.insert(record.id);
                Ok(record)
            }
        }
    }

    #[instrument(skip(self), fields(identity_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: IdentityId) -> Result<bool> {
        match self.records.remove(&id) {
            Some((_, record)) => {
                self.emails.remove(&record.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
