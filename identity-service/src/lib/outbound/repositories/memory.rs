//! Process-local stores for development and tests.
//!
//! Both enforce the same invariants as their Postgres counterparts; the
//! uniqueness checks and the write happen under one lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::TwitterId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::session::errors::SessionError;
use crate::session::models::SessionData;
use crate::session::ports::SessionStore;
use crate::user::errors::UserError;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

/// Reject `user` if another record already owns its username or Twitter id.
fn check_unique(users: &HashMap<UserId, User>, user: &User) -> Result<(), UserError> {
    for other in users.values().filter(|other| other.id != user.id) {
        if let (Some(mine), Some(theirs)) = (user.local_username(), other.local_username()) {
            if mine == theirs {
                return Err(UserError::UsernameAlreadyExists(mine.to_string()));
            }
        }
        if let (Some(mine), Some(theirs)) = (user.twitter_id(), other.twitter_id()) {
            if mine == theirs {
                return Err(UserError::TwitterIdAlreadyLinked(mine.to_string()));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(UserError::DatabaseError(format!(
                "duplicate user id {}",
                user.id
            )));
        }
        check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_local_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.local_username() == Some(username))
            .cloned())
    }

    async fn find_by_twitter_id(&self, twitter_id: &TwitterId) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.twitter_id() == Some(twitter_id))
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id.to_string()));
        }
        check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, (SessionData, DateTime<Utc>)>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionData>, SessionError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .read()
            .await
            .get(token)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(data, _)| data.clone()))
    }

    async fn save(
        &self,
        token: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .insert(token.to_string(), (data.clone(), expires_at));
        Ok(())
    }

    async fn destroy(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::user::models::LocalIdentity;
    use crate::domain::user::models::TwitterIdentity;

    fn local_user(name: &str) -> User {
        User::with_local(LocalIdentity {
            username: Username::new(name.to_string()).unwrap(),
            password_hash: "$argon2id$hash".to_string(),
        })
    }

    fn twitter(id: &str) -> TwitterIdentity {
        TwitterIdentity {
            id: TwitterId::new(id.to_string()).unwrap(),
            token: "token".to_string(),
            username: "bird".to_string(),
            display_name: "Bird".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repository = InMemoryUserRepository::new();
        let user = repository.create(local_user("alice")).await.unwrap();

        let username = Username::new("alice".to_string()).unwrap();
        assert_eq!(
            repository.find_by_local_username(&username).await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(repository.find_by_id(&user.id).await.unwrap(), Some(user));
        assert!(repository
            .find_by_twitter_id(&TwitterId::new("1".to_string()).unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_username_unique() {
        let repository = InMemoryUserRepository::new();
        repository.create(local_user("alice")).await.unwrap();

        let result = repository.create(local_user("alice")).await;
        assert!(matches!(result, Err(UserError::UsernameAlreadyExists(_))));
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_twitter_id_unique_across_update() {
        let repository = InMemoryUserRepository::new();
        let mut alice = local_user("alice");
        alice.link_twitter(twitter("42"));
        repository.create(alice).await.unwrap();

        let mut bob = repository.create(local_user("bob")).await.unwrap();
        bob.link_twitter(twitter("42"));
        let result = repository.update(bob).await;
        assert!(matches!(result, Err(UserError::TwitterIdAlreadyLinked(_))));
    }

    #[tokio::test]
    async fn test_update_own_record_passes_uniqueness() {
        let repository = InMemoryUserRepository::new();
        let mut alice = repository.create(local_user("alice")).await.unwrap();
        alice.link_twitter(twitter("42"));

        let updated = repository.update(alice.clone()).await.unwrap();
        assert_eq!(updated, alice);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repository = InMemoryUserRepository::new();
        let result = repository.update(local_user("ghost")).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_session_expiry() {
        let store = InMemorySessionStore::new();
        let data = SessionData {
            user_id: Some("abc".to_string()),
            ..SessionData::default()
        };

        store
            .save("live", &data, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .save("stale", &data, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(store.load("live").await.unwrap(), Some(data));
        assert_eq!(store.load("stale").await.unwrap(), None);
        assert_eq!(store.purge_expired().await.unwrap(), 1);

        store.destroy("live").await.unwrap();
        assert_eq!(store.load("live").await.unwrap(), None);
    }
}
