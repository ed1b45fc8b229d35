//! Extractors for the authentication state of a request.
//!
//! Both require [`session_gate`](crate::auth::middleware::session_gate) to have run.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    auth::{Identity, context::RequestContext},
    errors::{Error, Result},
};

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts.extensions.get::<RequestContext>().cloned().ok_or_else(|| Error::Internal {
            operation: "find request context: session gate is not installed".to_string(),
        })
    }
}

/// The logged-in identity. Rejects anonymous requests with `401 Unauthorized`.
///
/// For routes behind [`require_authenticated`](crate::auth::middleware::require_authenticated)
/// this always succeeds.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let context = RequestContext::from_request_parts(parts, state).await?;
        context
            .identity()
            .map(CurrentIdentity)
            .ok_or(Error::Unauthenticated { message: None })
    }
}
