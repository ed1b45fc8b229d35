//! Built-in local strategies: `signup` creates an identity, `login` checks one.

use std::sync::Arc;

use crate::{auth::strategy::StrategyTable, config::PasswordConfig, db::identities::IdentityStore};

pub mod login;
pub mod signup;

pub use login::LoginStrategy;
pub use signup::SignupStrategy;

/// Name the signup strategy is registered under
pub const SIGNUP: &str = "signup";
/// Name the login strategy is registered under
pub const LOGIN: &str = "login";

/// Table with the `signup` and `login` strategies registered over `identities`.
pub fn local_strategies(identities: Arc<dyn IdentityStore>, policy: PasswordConfig) -> StrategyTable {
    let mut table = StrategyTable::new();
    table
        .register(SIGNUP, SignupStrategy::new(identities.clone(), policy))
        .register(LOGIN, LoginStrategy::new(identities));
    table
}
