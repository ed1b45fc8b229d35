//! Page view models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{auth::Identity, types::IdentityId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityResponse {
    pub id: IdentityId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            created_at: identity.created_at,
        }
    }
}

/// Flash messages consumed for one render
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashView {
    pub error: Vec<String>,
    pub info: Vec<String>,
    pub success: Vec<String>,
}

impl FlashView {
    pub fn is_empty(&self) -> bool {
        self.error.is_empty() && self.info.is_empty() && self.success.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub page: String,
    pub identity: Option<IdentityResponse>,
    pub flash: FlashView,
}
