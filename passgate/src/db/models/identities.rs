//! Store models for identities.

use crate::types::IdentityId;
use chrono::{DateTime, Utc};

/// Request for creating a new identity. The password is already hashed.
#[derive(Debug, Clone)]
pub struct IdentityCreateDBRequest {
    pub email: String,
    pub password_hash: String,
}

/// Stored identity record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdentityDBResponse {
    pub id: IdentityId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
