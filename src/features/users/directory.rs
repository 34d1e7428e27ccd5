//! Local mirror of token identities.
//!
//! Events reference their reporter and notifications their recipient through
//! `users`, and the driver fan-out reads it, so every authenticated caller is
//! upserted here before the request reaches a handler.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Record the caller and their current role
    async fn sync_identity(&self, user: &AuthenticatedUser) -> Result<()>;
}

/// PostgreSQL-backed identity mirror
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn sync_identity(&self, user: &AuthenticatedUser) -> Result<()> {
        // The WHERE keeps repeat requests from rewriting an unchanged row
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, role)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET role = EXCLUDED.role, updated_at = NOW()
            WHERE users.role IS DISTINCT FROM EXCLUDED.role
            "#,
        )
        .bind(user.user_id)
        .bind(user.role)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to sync user identity: {:?}", e);
            AppError::Database(e)
        })?;

        if result.rows_affected() > 0 {
            tracing::info!("Synced identity {} as {}", user.user_id, user.role);
        }
        Ok(())
    }
}
