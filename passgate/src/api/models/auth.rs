//! Authentication form models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::strategy::Credentials;

/// Body of `POST /signup` and `POST /login` (`application/x-www-form-urlencoded`).
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for CredentialsForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<CredentialsForm> for Credentials {
    fn from(form: CredentialsForm) -> Self {
        Credentials::new(form.email, form.password)
    }
}
