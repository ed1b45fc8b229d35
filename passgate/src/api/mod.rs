//! HTTP layer.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Form and view structures
//!
//! # Routes
//!
//! - **Pages** (`/`, `/signup`, `/login`): JSON page views carrying the identity and the flash
//!   messages consumed for this render
//! - **Authentication** (`POST /signup`, `POST /login`, `/logout`): run a strategy or end the
//!   session, then redirect with a flash message
//! - **Protected** (`/profile`): only reachable with a logged-in identity
//! - **Health** (`/healthz`)

pub mod handlers;
pub mod models;
