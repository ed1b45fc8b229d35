//! Common type definitions.
//!
//! # ID Types
//!
//! - [`IdentityId`]: identity (user account) identifier, a UUID
//! - [`SessionId`]: opaque session token, a base64url string
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging
//! - [`normalize_email`]: Canonical form used for every email lookup and write

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type IdentityId = Uuid;

/// Opaque session token.
///
/// Carries no information about the identity it is bound to; the mapping lives in the session
/// store. Its `Debug` output is abbreviated so full tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for logs and traces
    pub fn abbrev(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", self.abbrev())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Trim and lower-case an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
