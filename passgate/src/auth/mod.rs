//! Authentication system.
//!
//! Local email/password authentication with server-side sessions:
//!
//! - Credentials posted to `/signup` or `/login` are handed to a named [`strategy::Strategy`]
//!   looked up in the [`strategy::StrategyTable`]
//! - An accepted identity is logged in through the per-request [`context::RequestContext`],
//!   which binds its [`session::SerializedIdentity`] to a fresh session in the session store
//! - The session id travels in a signed cookie ([`cookie`]); [`middleware::session_gate`]
//!   resolves it back to an identity on every request
//! - One-time messages for the next page view go through the [`flash`] channel
//!
//! # Modules
//!
//! - [`context`]: Per-request authentication state (identity, login, logout)
//! - [`cookie`]: Signed session cookie codec
//! - [`current_user`]: Extractors for handlers
//! - [`flash`]: One-time messages stored on the visitor's session
//! - [`middleware`]: Session gate and route protection
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: Identity <-> serialized identity
//! - [`strategies`]: The built-in `signup` and `login` strategies
//! - [`strategy`]: Strategy trait, outcomes and the registration table
//! - [`utils`]: Authentication helper functions
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use passgate::auth::current_user::CurrentIdentity;
//!
//! async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> String {
//!     format!("Hello, {}!", identity.email)
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db::models::identities::IdentityDBResponse, types::IdentityId};

pub mod context;
pub mod cookie;
pub mod current_user;
pub mod flash;
pub mod middleware;
pub mod password;
pub mod session;
pub mod strategies;
pub mod strategy;
pub mod utils;

/// An authenticated principal, as attached to requests.
///
/// Public projection of an identity record: the password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<IdentityDBResponse> for Identity {
    fn from(record: IdentityDBResponse) -> Self {
        Self {
            id: record.id,
            email: record.email,
            created_at: record.created_at,
        }
    }
}
