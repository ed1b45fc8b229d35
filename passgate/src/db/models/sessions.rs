//! Store models for sessions.

use crate::types::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flash messages pending on a session, grouped by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashMessages(BTreeMap<String, Vec<String>>);

impl FlashMessages {
    pub fn push(&mut self, key: &str, message: &str) {
        self.0.entry(key.to_string()).or_default().push(message.to_string());
    }

    /// Remove and return every message under `key`.
    pub fn take(&mut self, key: &str) -> Vec<String> {
        self.0.remove(key).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Request for creating a session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub serialized_identity: Option<String>,
    pub flash: FlashMessages,
    pub expires_at: DateTime<Utc>,
}

/// Stored session record
#[derive(Debug, Clone)]
pub struct SessionDBResponse {
    pub id: SessionId,
    pub serialized_identity: Option<String>,
    pub flash: FlashMessages,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionDBResponse {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
