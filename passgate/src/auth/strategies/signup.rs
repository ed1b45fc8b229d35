use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    auth::{
        password::{Argon2Params, hash_password},
        strategy::{Credentials, Outcome, Rejection, Strategy},
        utils::is_plausible_email,
    },
    config::PasswordConfig,
    db::{errors::DbError, identities::IdentityStore, models::identities::IdentityCreateDBRequest},
    errors::Error,
};

/// Creates a new identity from the submitted credentials.
///
/// Rejections, in the order they are checked: invalid email, password length outside the
/// configured policy, email already registered.
pub struct SignupStrategy {
    identities: Arc<dyn IdentityStore>,
    policy: PasswordConfig,
}

impl SignupStrategy {
    pub fn new(identities: Arc<dyn IdentityStore>, policy: PasswordConfig) -> Self {
        Self { identities, policy }
    }

    fn check_password_policy(&self, password: &str) -> Option<Rejection> {
        let length = password.chars().count();
        if length < self.policy.min_length {
            Some(Rejection::PasswordTooShort {
                min: self.policy.min_length,
            })
        } else if length > self.policy.max_length {
            Some(Rejection::PasswordTooLong {
                max: self.policy.max_length,
            })
        } else {
            None
        }
    }

    async fn try_signup(&self, credentials: Credentials) -> Result<Outcome, Error> {
        if !is_plausible_email(&credentials.email) {
            return Ok(Outcome::Rejected(Rejection::InvalidEmail));
        }
        if let Some(rejection) = self.check_password_policy(&credentials.password) {
            return Ok(Outcome::Rejected(rejection));
        }
        if self.identities.find_by_email(&credentials.email).await?.is_some() {
            return Ok(Outcome::Rejected(Rejection::EmailInUse));
        }

        let password_hash = hash_password(credentials.password, Argon2Params::from(&self.policy)).await?;
        let request = IdentityCreateDBRequest {
            email: credentials.email,
            password_hash,
        };

        match self.identities.create(&request).await {
            Ok(record) => {
                info!(identity_id = %record.id, "Created identity");
                Ok(Outcome::Accepted(record.into()))
            }
            // Lost a race with a concurrent signup for the same email
            Err(DbError::UniqueViolation { .. }) => Ok(Outcome::Rejected(Rejection::EmailInUse)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Strategy for SignupStrategy {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn authenticate(&self, credentials: Credentials) -> Outcome {
        self.try_signup(credentials).await.unwrap_or_else(Outcome::Failed)
    }
}
