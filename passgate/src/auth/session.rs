//! Identity serialization for sessions.
//!
//! A session stores only the identity id, never the record. Every request reloads the identity
//! through the store, so a deleted identity stops authenticating immediately.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    auth::Identity,
    db::{errors::DbError, identities::IdentityStore},
};

/// Compact, session-storable form of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedIdentity(String);

impl SerializedIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Clone)]
pub struct SessionSerializer {
    identities: Arc<dyn IdentityStore>,
}

impl SessionSerializer {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Deterministic: the same identity always serializes to the same value.
    pub fn serialize(&self, identity: &Identity) -> SerializedIdentity {
        SerializedIdentity(identity.id.to_string())
    }

    /// Resolve a serialized identity back to the identity it names.
    ///
    /// Malformed input and identities that no longer exist both resolve to `None`; only a failing
    /// store is an error.
    #[instrument(skip(self, serialized), err)]
    pub async fn deserialize(&self, serialized: &SerializedIdentity) -> Result<Option<Identity>, DbError> {
        let Ok(id) = Uuid::parse_str(serialized.as_str()) else {
            debug!("Ignoring malformed serialized identity");
            return Ok(None);
        };

        Ok(self.identities.find_by_id(id).await?.map(Identity::from))
    }
}
