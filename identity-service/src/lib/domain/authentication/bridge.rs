use std::sync::Arc;

use crate::user::errors::UserError;
use crate::user::models::User;
use crate::user::models::UserId;
use crate::user::ports::UserRepository;

/// Maps users to the identifier stored in the session and back.
pub struct SessionIdentityBridge<UR>
where
    UR: UserRepository + ?Sized,
{
    repository: Arc<UR>,
}

impl<UR> SessionIdentityBridge<UR>
where
    UR: UserRepository + ?Sized,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self { repository }
    }

    /// Identifier persisted in the session for `user`.
    pub fn serialize(&self, user: &User) -> String {
        user.id.to_string()
    }

    /// Resolve a session identifier to its user.
    ///
    /// # Returns
    /// `None` when the record is gone or the identifier is unparseable; the
    /// caller treats the session as unauthenticated.
    ///
    /// # Errors
    /// * `DatabaseError` - Store lookup failed
    pub async fn deserialize(&self, id: &str) -> Result<Option<User>, UserError> {
        let user_id = match UserId::from_string(id) {
            Ok(user_id) => user_id,
            Err(e) => {
                tracing::warn!(session_user_id = %id, error = %e, "Discarding malformed session identity");
                return Ok(None);
            }
        };

        self.repository.find_by_id(&user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::models::LocalIdentity;
    use crate::user::models::Username;
    use crate::user::ports::mocks::MockTestUserRepository;

    fn alice() -> User {
        User::with_local(LocalIdentity {
            username: Username::new("alice".to_string()).unwrap(),
            password_hash: "$argon2id$hash".to_string(),
        })
    }

    #[tokio::test]
    async fn test_serialize_then_deserialize() {
        let user = alice();
        let stored = user.clone();
        let user_id = user.id;

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let bridge = SessionIdentityBridge::new(Arc::new(repository));
        let id = bridge.serialize(&user);
        assert_eq!(id, user_id.to_string());

        let resolved = bridge.deserialize(&id).await.unwrap();
        assert_eq!(resolved, Some(user));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_an_error() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(1).returning(|_| Ok(None));

        let bridge = SessionIdentityBridge::new(Arc::new(repository));
        let resolved = bridge.deserialize(&UserId::new().to_string()).await;
        assert!(matches!(resolved, Ok(None)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Err(UserError::DatabaseError("connection reset".to_string())));

        let bridge = SessionIdentityBridge::new(Arc::new(repository));
        let resolved = bridge.deserialize(&UserId::new().to_string()).await;
        assert!(matches!(resolved, Err(UserError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_malformed_identifier_skips_store() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let bridge = SessionIdentityBridge::new(Arc::new(repository));
        assert!(matches!(bridge.deserialize("garbage").await, Ok(None)));
    }
}
