//! # passgate: local email/password authentication
//!
//! `passgate` is a small authentication service built with Axum. Visitors sign up and log in
//! with an email address and a password; a successful attempt binds their identity to a
//! server-side session, referenced from a signed cookie, and every later request is resolved
//! back to that identity before it reaches a handler.
//!
//! ## Architecture
//!
//! - **Strategies** ([`auth::strategy`]): named credential checks (`signup`, `login`) returning
//!   `Accepted`, `Rejected` or `Failed`. The handlers only know strategy names.
//! - **Identity store** ([`db::identities`]): user records with Argon2id password hashes,
//!   in memory or in PostgreSQL.
//! - **Session store** ([`db::sessions`]): session id to serialized identity, plus pending
//!   flash messages, in memory or in PostgreSQL.
//! - **Session gate** ([`auth::middleware`]): resolves the session cookie on every request and
//!   guards protected routes.
//!
//! ## Getting Started
//!
//! ```ignore
//! use passgate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = passgate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     passgate::telemetry::init_telemetry(config.log_format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! With `database.type: postgres`, migrations run automatically on startup. They can also be
//! applied by hand:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! passgate::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, error, info};

pub use config::Config;

use crate::{
    api::handlers::{auth as auth_handlers, health, identities as identity_handlers, pages},
    auth::{
        cookie::CookieCodec,
        middleware::{require_authenticated, session_gate},
        session::SessionSerializer,
        strategies::local_strategies,
        strategy::StrategyTable,
    },
    config::{DatabaseConfig, PoolSettings},
    db::{
        identities::{IdentityStore, InMemoryIdentities, PgIdentities},
        sessions::{InMemorySessions, PgSessions, SessionStore},
    },
};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `config`: Application configuration loaded from file/environment
/// - `identities`: Identity store backend
/// - `sessions`: Session store backend
/// - `strategies`: Credential strategies, invoked by name from the auth handlers
/// - `cookies`: Session cookie signer
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .identities(identities)
///     .sessions(sessions)
///     .strategies(Arc::new(strategies))
///     .cookies(CookieCodec::new(&secret_key)?)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub identities: Arc<dyn IdentityStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub strategies: Arc<StrategyTable>,
    pub cookies: CookieCodec,
}

impl AppState {
    pub fn serializer(&self) -> SessionSerializer {
        SessionSerializer::new(self.identities.clone())
    }
}

/// Get the passgate database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Store backends selected by configuration.
struct Stores {
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionStore>,
    pool: Option<PgPool>,
}

async fn connect_pool(url: &str, settings: &PoolSettings) -> anyhow::Result<PgPool> {
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
        .connect(url)
        .await?;
    Ok(pool)
}

/// Create the configured stores, connecting and migrating the database if there is one.
async fn setup_stores(config: &Config) -> anyhow::Result<Stores> {
    match &config.database {
        DatabaseConfig::Memory => {
            info!("Using in-memory stores: identities and sessions are lost on shutdown");
            Ok(Stores {
                identities: Arc::new(InMemoryIdentities::new()),
                sessions: Arc::new(InMemorySessions::new()),
                pool: None,
            })
        }
        DatabaseConfig::Postgres { url, pool: settings } => {
            info!("Using PostgreSQL stores");
            let pool = connect_pool(url, settings).await?;
            migrator().run(&pool).await?;
            Ok(Stores {
                identities: Arc::new(PgIdentities::new(pool.clone())),
                sessions: Arc::new(PgSessions::new(pool.clone())),
                pool: Some(pool),
            })
        }
    }
}

/// Build the application router.
///
/// Every route except `/healthz` runs behind [`session_gate`]; `/profile` additionally requires
/// an authenticated identity and `/api/me` answers `401` without one.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/profile", get(pages::profile))
        .route_layer(from_fn_with_state(state.clone(), require_authenticated));

    Router::new()
        .route("/", get(pages::home))
        .route("/signup", get(pages::signup_page).post(auth_handlers::signup))
        .route("/login", get(pages::login_page).post(auth_handlers::login))
        .route("/logout", get(auth_handlers::logout).post(auth_handlers::logout))
        .route("/api/me", get(identity_handlers::current_identity))
        .merge(protected)
        .layer(from_fn_with_state(state.clone(), session_gate))
        .route("/healthz", get(health::healthz))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Periodically remove expired sessions until `shutdown` is cancelled.
fn spawn_session_purger(sessions: Arc<dyn SessionStore>, every: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Session purger stopping");
                    break;
                }
                _ = ticker.tick() => match sessions.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => info!(purged, "Purged expired sessions"),
                    Err(e) => error!("Failed to purge expired sessions: {:#}", e),
                },
            }
        }
    })
}

/// Background tasks running alongside the HTTP server.
///
/// Dropping this cancels the tasks through `drop_guard`.
pub struct BackgroundServices {
    background_tasks: Vec<JoinHandle<()>>,
    drop_guard: DropGuard,
}

impl BackgroundServices {
    fn start(state: &AppState) -> Self {
        let shutdown_token = CancellationToken::new();

        let purger = spawn_session_purger(
            state.sessions.clone(),
            state.config.auth.session.purge_interval,
            shutdown_token.clone(),
        );

        Self {
            background_tasks: vec![purger],
            drop_guard: shutdown_token.drop_guard(),
        }
    }

    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        let Self {
            background_tasks,
            drop_guard,
        } = self;
        drop_guard.disarm().cancel();

        for handle in background_tasks {
            let _ = handle.await;
        }
    }
}

pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
    pool: Option<PgPool>,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(bind = %config.bind_address(), "Starting passgate");

        let secret_key = config
            .secret_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("secret_key is not configured"))?;
        let cookies = CookieCodec::new(secret_key)?;

        let stores = setup_stores(&config).await?;
        let strategies = local_strategies(stores.identities.clone(), config.auth.password.clone());
        info!(strategies = ?strategies.names(), "Registered credential strategies");

        let app_state = AppState::builder()
            .config(config.clone())
            .identities(stores.identities)
            .sessions(stores.sessions)
            .strategies(Arc::new(strategies))
            .cookies(cookies)
            .build();

        let bg_services = BackgroundServices::start(&app_state);
        let router = build_router(app_state.clone());

        Ok(Self {
            router,
            app_state,
            config,
            pool: stores.pool,
            bg_services,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "passgate listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Shutdown background services and wait for tasks to complete
        self.bg_services.shutdown().await;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}
