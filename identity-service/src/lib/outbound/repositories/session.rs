use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::session::errors::SessionError;
use crate::session::models::SessionData;
use crate::session::ports::SessionStore;

pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionData>, SessionError> {
        let data = sqlx::query_scalar::<_, Json<SessionData>>(
            r#"
            SELECT data
            FROM sessions
            WHERE token = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::StoreError(e.to_string()))?;

        Ok(data.map(|Json(data)| data))
    }

    async fn save(
        &self,
        token: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let data = serde_json::to_value(data)
            .map_err(|e| SessionError::SerializationFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (token, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (token)
            DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(token)
        .bind(data)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::StoreError(e.to_string()))?;

        Ok(())
    }

    async fn destroy(&self, token: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::StoreError(e.to_string()))?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::StoreError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
