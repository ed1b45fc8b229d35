//! PostgreSQL session store.
//!
//! Flash messages live in a JSONB column keyed by flash key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use tracing::instrument;

use super::SessionStore;
use crate::{
    auth::utils::generate_session_token,
    db::{
        errors::Result,
        models::sessions::{FlashMessages, SessionCreateDBRequest, SessionDBResponse},
    },
    types::SessionId,
};

// Database entity model
#[derive(Debug, FromRow)]
struct Session {
    id: String,
    serialized_identity: Option<String>,
    flash: Json<FlashMessages>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<Session> for SessionDBResponse {
    fn from(session: Session) -> Self {
        Self {
            id: SessionId::new(session.id),
            serialized_identity: session.serialized_identity,
            flash: session.flash.0,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Clone)]
pub struct PgSessions {
    db: PgPool,
}

impl PgSessions {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessions {
    #[instrument(skip(self, request), err)]
    async fn create(&self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, serialized_identity, flash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, serialized_identity, flash, created_at, expires_at
            "#,
        )
        .bind(generate_session_token())
        .bind(&request.serialized_identity)
        .bind(Json(&request.flash))
        .bind(request.expires_at)
        .fetch_one(&self.db)
        .await?;

        Ok(session.into())
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn get(&self, id: &SessionId) -> Result<Option<SessionDBResponse>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, serialized_identity, flash, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.db)
        .await?;

        Ok(session.map(Into::into))
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn touch(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1 AND expires_at > NOW()")
            .bind(id.as_str())
            .bind(expires_at)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn destroy(&self, id: &SessionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, message), fields(session_id = %id.abbrev()), err)]
    async fn push_flash(&self, id: &SessionId, key: &str, message: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET flash = jsonb_set(flash, ARRAY[$2], COALESCE(flash -> $2, '[]'::jsonb) || to_jsonb($3::text))
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id.as_str())
        .bind(key)
        .bind(message)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(session_id = %id.abbrev()), err)]
    async fn take_flash(&self, id: &SessionId, key: &str) -> Result<Vec<String>> {
        // The subquery reads and locks the row before the update removes the key, so concurrent
        // takes see the key exactly once
        let messages = sqlx::query_scalar::<_, Option<Json<Vec<String>>>>(
            r#"
            UPDATE sessions s
            SET flash = s.flash - $2
            FROM (
                SELECT id, flash -> $2 AS messages
                FROM sessions
                WHERE id = $1 AND expires_at > NOW()
                FOR UPDATE
            ) previous
            WHERE s.id = previous.id
            RETURNING previous.messages
            "#,
        )
        .bind(id.as_str())
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        Ok(messages.flatten().map(|Json(messages)| messages).unwrap_or_default())
    }

    #[instrument(skip(self), err)]
    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
