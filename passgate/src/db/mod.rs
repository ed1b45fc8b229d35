//! Persistence layer: identity and session stores.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Strategies / Gate│  (auth)
//! └────────┬─────────┘
//!          │  Arc<dyn IdentityStore>, Arc<dyn SessionStore>
//!          ↓
//! ┌──────────────────┐
//! │      Stores      │  (db::identities, db::sessions)
//! └────────┬─────────┘
//!          │
//!          ↓
//! ┌──────────────────┐
//! │ memory | postgres│
//! └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`identities`]: Identity store adapter (`find_by_email`, `find_by_id`, `create`)
//! - [`sessions`]: Session rows and their flash messages
//! - [`models`]: Record structures handed to and returned by stores
//! - [`errors`]: Store error type
//!
//! # Migrations
//!
//! PostgreSQL migrations live in `migrations/` and are embedded with `sqlx::migrate!`.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! passgate::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod identities;
pub mod models;
pub mod sessions;
