use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    auth::{
        password::verify_password,
        strategy::{Credentials, Outcome, Rejection, Strategy},
    },
    db::identities::IdentityStore,
    errors::Error,
};

/// Checks credentials against an existing identity.
pub struct LoginStrategy {
    identities: Arc<dyn IdentityStore>,
}

impl LoginStrategy {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    async fn try_login(&self, credentials: Credentials) -> Result<Outcome, Error> {
        let Some(record) = self.identities.find_by_email(&credentials.email).await? else {
            return Ok(Outcome::Rejected(Rejection::NoSuchUser));
        };

        if !verify_password(credentials.password, record.password_hash.clone()).await? {
            return Ok(Outcome::Rejected(Rejection::WrongPassword));
        }

        Ok(Outcome::Accepted(record.into()))
    }
}

#[async_trait]
impl Strategy for LoginStrategy {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn authenticate(&self, credentials: Credentials) -> Outcome {
        self.try_login(credentials).await.unwrap_or_else(Outcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::password::hash_string_with_params,
        auth::password::Argon2Params,
        db::{identities::InMemoryIdentities, models::identities::IdentityCreateDBRequest},
    };

    async fn store_with(email: &str, password_hash: String) -> Arc<InMemoryIdentities> {
        let identities = Arc::new(InMemoryIdentities::new());
        identities
            .create(&IdentityCreateDBRequest {
                email: email.to_string(),
                password_hash,
            })
            .await
            .unwrap();
        identities
    }

    fn fast_hash(password: &str) -> String {
        let params = Argon2Params {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        };
        hash_string_with_params(password, params).unwrap()
    }

    #[tokio::test]
    async fn test_login_accepts_matching_password() {
        let identities = store_with("a@x.com", fast_hash("hunter2")).await;
        let login = LoginStrategy::new(identities);

        match login.authenticate(Credentials::new("A@x.com ", "hunter2")).await {
            Outcome::Accepted(identity) => assert_eq!(identity.email, "a@x.com"),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_rejections() {
        let identities = store_with("a@x.com", fast_hash("hunter2")).await;
        let login = LoginStrategy::new(identities);

        let cases = vec![
            ("a@x.com", "hunter3", Rejection::WrongPassword),
            ("a@x.com", "", Rejection::WrongPassword),
            ("nobody@x.com", "hunter2", Rejection::NoSuchUser),
        ];

        for (email, password, expected) in cases {
            match login.authenticate(Credentials::new(email, password)).await {
                Outcome::Rejected(rejection) => assert_eq!(rejection, expected, "for {email}/{password}"),
                other => panic!("expected rejection for {email}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_fails() {
        let identities = store_with("a@x.com", "not-a-hash".to_string()).await;
        let login = LoginStrategy::new(identities);

        let outcome = login.authenticate(Credentials::new("a@x.com", "hunter2")).await;
        assert!(matches!(outcome, Outcome::Failed(Error::Internal { .. })));
    }
}
