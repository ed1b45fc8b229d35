//! Per-request authentication state.
//!
//! [`session_gate`](crate::auth::middleware::session_gate) builds one [`RequestContext`] per
//! request and stores it in the request extensions. Handlers read the identity from it, log
//! identities in and out through it, and reach the flash channel through it. Once the handler
//! has run, the gate turns whatever the context recorded into a `Set-Cookie` header.

use chrono::{TimeDelta, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    auth::{
        Identity,
        flash::Flash,
        session::{SerializedIdentity, SessionSerializer},
    },
    db::{
        models::sessions::{FlashMessages, SessionCreateDBRequest},
        sessions::SessionStore,
    },
    errors::Error,
    types::SessionId,
};

/// What the response must do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    Unchanged,
    /// Send (or re-send, for rolling renewal) a cookie for this session
    Set(SessionId),
    /// Remove the cookie from the browser
    Clear,
}

struct ContextState {
    session_id: Option<SessionId>,
    identity: Option<Identity>,
    cookie: CookieChange,
}

struct Inner {
    sessions: Arc<dyn SessionStore>,
    serializer: SessionSerializer,
    ttl: TimeDelta,
    state: Mutex<ContextState>,
}

/// Authentication state of the current request. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

impl RequestContext {
    /// Anonymous context with no session.
    pub fn new(sessions: Arc<dyn SessionStore>, serializer: SessionSerializer, ttl: TimeDelta) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions,
                serializer,
                ttl,
                state: Mutex::new(ContextState {
                    session_id: None,
                    identity: None,
                    cookie: CookieChange::Unchanged,
                }),
            }),
        }
    }

    /// The identity attached to this request, if any
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.lock().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.lock().identity.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.state.lock().session_id.clone()
    }

    /// Flash channel of this visitor
    pub fn flash(&self) -> Flash<'_> {
        Flash::new(self)
    }

    pub(crate) fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.inner.sessions
    }

    pub(crate) fn cookie_change(&self) -> CookieChange {
        self.inner.state.lock().cookie.clone()
    }

    fn expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + self.inner.ttl
    }

    /// Attach the session a verified cookie points at.
    ///
    /// A session that no longer exists (destroyed, expired or purged) leaves the request
    /// anonymous and clears the stale cookie. With `rolling`, a live session's expiry is pushed
    /// forward and the cookie re-sent.
    #[instrument(skip(self, id), fields(session_id = %id.abbrev()), err)]
    pub async fn resume(&self, id: SessionId, rolling: bool) -> Result<(), Error> {
        let Some(session) = self.inner.sessions.get(&id).await? else {
            debug!("Session cookie refers to no live session");
            self.inner.state.lock().cookie = CookieChange::Clear;
            return Ok(());
        };

        let identity = match session.serialized_identity {
            Some(serialized) => {
                let identity = self.inner.serializer.deserialize(&SerializedIdentity::new(serialized)).await?;
                if identity.is_none() {
                    debug!("Session identity no longer resolves, continuing anonymously");
                }
                identity
            }
            None => None,
        };

        let renewed = rolling && self.inner.sessions.touch(&id, self.expiry()).await?;

        let mut state = self.inner.state.lock();
        state.identity = identity;
        if renewed {
            state.cookie = CookieChange::Set(id.clone());
        }
        state.session_id = Some(id);
        Ok(())
    }

    /// Forget a cookie that could not be verified.
    pub(crate) fn reject_cookie(&self) {
        self.inner.state.lock().cookie = CookieChange::Clear;
    }

    /// Bind `identity` to a brand new session.
    ///
    /// The previous session, if any, is destroyed after its pending flash messages are carried
    /// over, so a session id obtained before login is never valid after it.
    #[instrument(skip(self, identity), fields(identity_id = %identity.id), err)]
    pub async fn log_in(&self, identity: Identity) -> Result<(), Error> {
        let previous = self.session_id();

        let flash = match &previous {
            Some(id) => self
                .inner
                .sessions
                .get(id)
                .await?
                .map(|session| session.flash)
                .unwrap_or_default(),
            None => FlashMessages::default(),
        };

        let serialized = self.inner.serializer.serialize(&identity);
        let session = self
            .inner
            .sessions
            .create(&SessionCreateDBRequest {
                serialized_identity: Some(serialized.into_inner()),
                flash,
                expires_at: self.expiry(),
            })
            .await?;

        if let Some(id) = &previous {
            self.inner.sessions.destroy(id).await?;
        }

        info!(session_id = %session.id.abbrev(), "Logged in");
        let mut state = self.inner.state.lock();
        state.cookie = CookieChange::Set(session.id.clone());
        state.session_id = Some(session.id);
        state.identity = Some(identity);
        Ok(())
    }

    /// Destroy the session and clear the cookie. Returns whether an identity was logged in.
    ///
    /// Harmless for anonymous visitors.
    #[instrument(skip(self), err)]
    pub async fn log_out(&self) -> Result<bool, Error> {
        let (previous, was_authenticated) = {
            let mut state = self.inner.state.lock();
            let was_authenticated = state.identity.take().is_some();
            (state.session_id.take(), was_authenticated)
        };

        if let Some(id) = &previous {
            self.inner.sessions.destroy(id).await?;
            self.inner.state.lock().cookie = CookieChange::Clear;
        }

        if was_authenticated {
            info!("Logged out");
        }
        Ok(was_authenticated)
    }

    /// Current session id, creating an anonymous session if there is none.
    pub(crate) async fn ensure_session(&self) -> Result<SessionId, Error> {
        if let Some(id) = self.session_id() {
            return Ok(id);
        }

        let session = self
            .inner
            .sessions
            .create(&SessionCreateDBRequest {
                serialized_identity: None,
                flash: FlashMessages::default(),
                expires_at: self.expiry(),
            })
            .await?;
        debug!(session_id = %session.id.abbrev(), "Started anonymous session");

        let mut state = self.inner.state.lock();
        state.cookie = CookieChange::Set(session.id.clone());
        state.session_id = Some(session.id.clone());
        Ok(session.id)
    }

    /// Drop a session id that the store no longer knows.
    pub(crate) fn forget_session(&self, id: &SessionId) {
        let mut state = self.inner.state.lock();
        if state.session_id.as_ref() == Some(id) {
            state.session_id = None;
            state.identity = None;
        }
    }
}
