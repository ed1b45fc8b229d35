//! Test utilities: in-memory application state and cheap password hashing.

use axum_test::TestServer;
use std::sync::Arc;

use crate::{
    AppState, build_router,
    auth::{cookie::CookieCodec, strategies::local_strategies},
    config::{AuthConfig, Config, PasswordConfig, SessionConfig},
    db::{identities::InMemoryIdentities, sessions::InMemorySessions},
};

pub const TEST_SECRET_KEY: &str = "passgate-test-secret-key-0123456789";

/// Default password policy with Argon2 parameters cheap enough for tests
pub fn fast_password_policy() -> PasswordConfig {
    PasswordConfig {
        argon2_memory_kib: 8,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    }
}

/// Valid in-memory configuration for tests
pub fn test_config() -> Config {
    Config {
        secret_key: Some(TEST_SECRET_KEY.to_string()),
        auth: AuthConfig {
            session: SessionConfig {
                cookie_secure: false,
                ..Default::default()
            },
            password: fast_password_policy(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Application state over fresh in-memory stores, with the local strategies registered
pub fn test_state() -> AppState {
    let config = test_config();
    let identities = Arc::new(InMemoryIdentities::new());
    let strategies = local_strategies(identities.clone(), config.auth.password.clone());

    AppState::builder()
        .config(config)
        .identities(identities)
        .sessions(Arc::new(InMemorySessions::new()))
        .strategies(Arc::new(strategies))
        .cookies(CookieCodec::new(TEST_SECRET_KEY).expect("Failed to create cookie codec"))
        .build()
}

pub fn test_server() -> TestServer {
    TestServer::new(build_router(test_state())).expect("Failed to create test server")
}
