//! PostgreSQL identity store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::IdentityStore;
use crate::{
    db::{
        errors::Result,
        models::identities::{IdentityCreateDBRequest, IdentityDBResponse},
    },
    types::{IdentityId, abbrev_uuid, normalize_email},
};

#[derive(Clone)]
pub struct PgIdentities {
    db: PgPool,
}

impl PgIdentities {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for PgIdentities {
    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityDBResponse>> {
        let identity = sqlx::query_as::<_, IdentityDBResponse>(
            "SELECT id, email, password_hash, created_at FROM identities WHERE lower(email) = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?;

        Ok(identity)
    }

    #[instrument(skip(self), fields(identity_id = %abbrev_uuid(&id)), err)]
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<IdentityDBResponse>> {
        let identity =
            sqlx::query_as::<_, IdentityDBResponse>("SELECT id, email, password_hash, created_at FROM identities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(identity)
    }

    #[instrument(skip(self, request), err)]
    async fn create(&self, request: &IdentityCreateDBRequest) -> Result<IdentityDBResponse> {
        // Single statement: either the row exists afterwards or nothing was written
        let identity = sqlx::query_as::<_, IdentityDBResponse>(
            r#"
            INSERT INTO identities (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(normalize_email(&request.email))
        .bind(&request.password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(identity)
    }

    #[instrument(skip(self), fields(identity_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: IdentityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1").bind(id).execute(&self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}
