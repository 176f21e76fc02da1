use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::session::errors::SessionError;
use crate::session::models::SessionData;

/// Durable storage of server-side sessions keyed by the cookie token.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load a session. Expired and unknown tokens both yield `None`.
    async fn load(&self, token: &str) -> Result<Option<SessionData>, SessionError>;

    /// Insert or replace a session.
    async fn save(
        &self,
        token: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError>;

    /// Remove a session. Unknown tokens are ignored.
    async fn destroy(&self, token: &str) -> Result<(), SessionError>;

    /// Delete expired sessions, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionError>;
}
