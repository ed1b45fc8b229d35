//! Credential strategies.
//!
//! A strategy turns submitted [`Credentials`] into exactly one [`Outcome`]. Strategies are kept
//! in a [`StrategyTable`] under a name, and the HTTP handlers invoke them by that name, so a new
//! way of checking credentials is added by registering it, not by touching the handlers.
//!
//! Anything implementing [`Strategy`] can be registered, including plain async closures:
//!
//! ```ignore
//! let mut table = StrategyTable::new();
//! table.register("nobody", |_credentials: Credentials| async {
//!     Outcome::Rejected(Rejection::NoSuchUser)
//! });
//! ```

use async_trait::async_trait;
use std::{collections::HashMap, fmt, future::Future, sync::Arc};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{auth::Identity, errors::Error, types::normalize_email};

/// Submitted email/password pair.
///
/// The email is normalized on construction. `Debug` never prints the password.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email.as_ref()),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Why a strategy refused credentials. The display text is what the visitor is shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("email in use")]
    EmailInUse,
    #[error("no such user")]
    NoSuchUser,
    #[error("wrong password")]
    WrongPassword,
    #[error("invalid email")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("password must be no more than {max} characters")]
    PasswordTooLong { max: usize },
}

/// Result of running a strategy.
#[derive(Debug)]
pub enum Outcome {
    /// Credentials accepted; the identity should be logged in
    Accepted(Identity),
    /// Credentials refused for a reason the visitor may see
    Rejected(Rejection),
    /// The strategy could not reach a verdict
    Failed(Error),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }
}

#[async_trait]
pub trait Strategy: Send + Sync {
    /// Check the credentials. Must resolve to exactly one outcome on every path.
    async fn authenticate(&self, credentials: Credentials) -> Outcome;
}

#[async_trait]
impl<F, Fut> Strategy for F
where
    F: Fn(Credentials) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    async fn authenticate(&self, credentials: Credentials) -> Outcome {
        self(credentials).await
    }
}

/// Named strategies available to the application.
#[derive(Clone, Default)]
pub struct StrategyTable {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under `name`, replacing any strategy already registered there.
    pub fn register(&mut self, name: impl Into<String>, strategy: impl Strategy + 'static) -> &mut Self {
        let name = name.into();
        if self.strategies.insert(name.clone(), Arc::new(strategy)).is_some() {
            debug!(strategy = %name, "Replaced registered strategy");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered strategy names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the strategy registered under `name`.
    ///
    /// An unknown name is a server-side misconfiguration and fails rather than rejects.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn invoke(&self, name: &str, credentials: Credentials) -> Outcome {
        let Some(strategy) = self.strategies.get(name) else {
            return Outcome::Failed(Error::Internal {
                operation: format!("find strategy '{name}'"),
            });
        };

        let outcome = strategy.authenticate(credentials).await;
        match &outcome {
            Outcome::Accepted(identity) => debug!(identity_id = %identity.id, "Credentials accepted"),
            Outcome::Rejected(rejection) => debug!(%rejection, "Credentials rejected"),
            Outcome::Failed(error) => debug!(%error, "Strategy failed"),
        }
        outcome
    }
}
