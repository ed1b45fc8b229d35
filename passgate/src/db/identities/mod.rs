//! Identity store adapter.
//!
//! The only way the rest of the crate reads or writes identity records. Two backends:
//!
//! - [`InMemoryIdentities`]: `dashmap`-backed, for development and tests
//! - [`PgIdentities`]: PostgreSQL via `sqlx`
//!
//! Emails are normalized (trimmed, lower-cased) by the store on both lookup and write, so callers
//! never see two records differing only in case.

use async_trait::async_trait;

use crate::{
    db::{
        errors::Result,
        models::identities::{IdentityCreateDBRequest, IdentityDBResponse},
    },
    types::IdentityId,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryIdentities;
pub use postgres::PgIdentities;

/// Name of the unique constraint guarding identity emails.
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "identities_email_unique";

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by email (normalized before lookup)
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityDBResponse>>;

    /// Look up an identity by ID
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<IdentityDBResponse>>;

    /// Create an identity. All-or-nothing: on error no record exists.
    ///
    /// # Errors
    /// - `DbError::UniqueViolation` if the normalized email is already taken
    async fn create(&self, request: &IdentityCreateDBRequest) -> Result<IdentityDBResponse>;

    /// Delete an identity by ID, returning whether it existed
    async fn delete(&self, id: IdentityId) -> Result<bool>;
}
