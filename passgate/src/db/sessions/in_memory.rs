//! In-memory session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::instrument;

use super::SessionStore;
use crate::{
    auth::utils::generate_session_token,
    db::{
        errors::Result,
        models::sessions::{SessionCreateDBRequest, SessionDBResponse},
    },
    types::SessionId,
};

#[derive(Clone, Default)]
pub struct InMemorySessions {
    sessions: Arc<DashMap<SessionId, SessionDBResponse>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    #[instrument(skip(self, request), err)]
    async fn create(&self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse> {
        let session = SessionDBResponse {
            id: SessionId::new(generate_session_token()),
            serialized_identity: request.serialized_identity.clone(),
            flash: request.flash.clone(),
            created_at: Utc::now(),
            expires_at: request.expires_at,
        };
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn get(&self, id: &SessionId) -> Result<Option<SessionDBResponse>> {
        let now = Utc::now();
        // Expired sessions are dropped on sight
        let removed = self.sessions.remove_if(id, |_, session| session.is_expired(now));
        if removed.is_some() {
            return Ok(None);
        }
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn touch(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Result<bool> {
        let now = Utc::now();
        match self.sessions.get_mut(id) {
            Some(mut session) if !session.is_expired(now) => {
                session.expires_at = expires_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn destroy(&self, id: &SessionId) -> Result<bool> {
        Ok(self.sessions.remove(id).is_some())
    }

    #[instrument(skip(self, message), fields(session_id = %id.abbrev()), err)]
    async fn push_flash(&self, id: &SessionId, key: &str, message: &str) -> Result<bool> {
        let now = Utc::now();
        match self.sessions.get_mut(id) {
            Some(mut session) if !session.is_expired(now) => {
                session.flash.push(key, message);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn take_flash(&self, id: &SessionId, key: &str) -> Result<Vec<String>> {
        let now = Utc::now();
        // get_mut holds the shard lock, so read-and-clear is atomic
        match self.sessions.get_mut(id) {
            Some(mut session) if !session.is_expired(now) => Ok(session.flash.take(key)),
            _ => Ok(Vec::new()),
        }
    }

    #[instrument(skip(self), err)]
    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}
