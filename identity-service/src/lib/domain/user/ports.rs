use async_trait::async_trait;

use crate::domain::user::models::TwitterId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;

/// User Record Store.
///
/// Lookups return `Ok(None)` for a missing record; `Err` is reserved for
/// infrastructure failures.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - `local.username` is taken
    /// * `TwitterIdAlreadyLinked` - `twitter.id` belongs to another record
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by exact `local.username`.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_local_username(&self, username: &Username)
        -> Result<Option<User>, UserError>;

    /// Retrieve user by `twitter.id`.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_twitter_id(&self, twitter_id: &TwitterId) -> Result<Option<User>, UserError>;

    /// Save an existing user, overwriting both sub-records.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `UsernameAlreadyExists` - New username is already taken
    /// * `TwitterIdAlreadyLinked` - Twitter id belongs to another record
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;
}
