//! One-time messages for the visitor's next page view.
//!
//! Messages are stored on the visitor's session under a key (`error`, `info`, `success`, ...)
//! and removed when read, so each one is shown exactly once. Setting a message for a visitor
//! without a session starts an anonymous one.

use tracing::{instrument, warn};

use crate::{auth::context::RequestContext, errors::Error};

pub const ERROR: &str = "error";
pub const INFO: &str = "info";
pub const SUCCESS: &str = "success";

pub struct Flash<'a> {
    context: &'a RequestContext,
}

impl<'a> Flash<'a> {
    pub(crate) fn new(context: &'a RequestContext) -> Self {
        Self { context }
    }

    /// Queue `message` under `key` for the next page view.
    #[instrument(skip(self, message), err)]
    pub async fn set(&self, key: &str, message: impl AsRef<str>) -> Result<(), Error> {
        let message = message.as_ref();
        let id = self.context.ensure_session().await?;
        if self.context.sessions().push_flash(&id, key, message).await? {
            return Ok(());
        }

        // The session expired or was purged mid-request; start over with a fresh one
        warn!(session_id = %id.abbrev(), "Session vanished while setting flash message");
        self.context.forget_session(&id);
        let id = self.context.ensure_session().await?;
        if self.context.sessions().push_flash(&id, key, message).await? {
            Ok(())
        } else {
            Err(Error::Internal {
                operation: format!("store flash message under '{key}'"),
            })
        }
    }

    /// Read and remove every message under `key`.
    #[instrument(skip(self), err)]
    pub async fn consume(&self, key: &str) -> Result<Vec<String>, Error> {
        match self.context.session_id() {
            Some(id) => Ok(self.context.sessions().take_flash(&id, key).await?),
            None => Ok(Vec::new()),
        }
    }
}
