//! Session resolution and route protection.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    auth::{
        context::{CookieChange, RequestContext},
        cookie::{clear_cookie_header, read_cookie, set_cookie_header},
    },
    errors::Error,
};

/// Resolve the session cookie and attach a [`RequestContext`] to every request.
///
/// A missing cookie, a cookie with a bad signature and a cookie for a dead session all leave the
/// request anonymous; the latter two also clear the cookie. A failing session or identity store
/// fails the request.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, Error> {
    let config = &state.config.auth.session;
    let context = RequestContext::new(state.sessions.clone(), state.serializer(), config.ttl());

    let presented = read_cookie(request.headers(), &config.cookie_name).map(|value| state.cookies.unsign(value));
    if let Some(verified) = presented {
        match verified {
            Some(id) => context.resume(id, config.rolling).await?,
            None => {
                debug!("Ignoring session cookie with invalid signature");
                context.reject_cookie();
            }
        }
    }
    trace!(authenticated = context.is_authenticated(), "Session resolved");

    request.extensions_mut().insert(context.clone());
    let mut response = next.run(request).await;

    let set_cookie = match context.cookie_change() {
        CookieChange::Unchanged => return Ok(response),
        CookieChange::Set(id) => set_cookie_header(config, &state.cookies.sign(&id)),
        CookieChange::Clear => clear_cookie_header(config),
    };
    let value = HeaderValue::from_str(&set_cookie).map_err(|e| Error::Internal {
        operation: format!("build session cookie header: {e}"),
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);

    Ok(response)
}

/// Run the wrapped routes only for authenticated visitors; redirect everyone else to the
/// configured denial path.
///
/// Must be layered inside [`session_gate`].
pub async fn require_authenticated(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let context = request.extensions().get::<RequestContext>().cloned().ok_or_else(|| Error::Internal {
        operation: "find request context: session gate is not installed".to_string(),
    })?;

    if context.is_authenticated() {
        return Ok(next.run(request).await);
    }

    debug!(path = %request.uri().path(), "Denied anonymous access to protected route");
    Ok(Redirect::to(&state.config.auth.redirects.denied).into_response())
}
