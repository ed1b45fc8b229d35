//! Session store.
//!
//! Owns the mapping from an opaque [`SessionId`] to the serialized identity it is bound to, plus
//! the flash messages pending for that visitor. Expired sessions behave exactly like missing
//! ones: reads return `None`, writes report `false`.
//!
//! Backends mirror the identity store: [`InMemorySessions`] and [`PgSessions`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::{
        errors::Result,
        models::sessions::{SessionCreateDBRequest, SessionDBResponse},
    },
    types::SessionId,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySessions;
pub use postgres::PgSessions;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session under a freshly generated ID
    async fn create(&self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse>;

    /// Load a live session; `None` if it never existed, was destroyed, or has expired
    async fn get(&self, id: &SessionId) -> Result<Option<SessionDBResponse>>;

    /// Push the expiry of a live session to `expires_at`
    async fn touch(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Result<bool>;

    /// Destroy a session, returning whether it existed
    async fn destroy(&self, id: &SessionId) -> Result<bool>;

    /// Append a flash message to a live session
    async fn push_flash(&self, id: &SessionId, key: &str, message: &str) -> Result<bool>;

    /// Atomically read and remove the flash messages under `key`
    async fn take_flash(&self, id: &SessionId, key: &str) -> Result<Vec<String>>;

    /// Remove every expired session, returning how many were removed
    async fn purge_expired(&self) -> Result<u64>;
}
