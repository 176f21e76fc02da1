use std::sync::Arc;

use async_trait::async_trait;

use crate::authentication::errors::AuthError;
use crate::authentication::models::AuthOutcome;
use crate::authentication::models::Credentials;
use crate::authentication::models::Rejection;
use crate::authentication::models::TwitterCallback;
use crate::authentication::registry::AuthenticationStrategy;
use crate::authentication::registry::TWITTER;
use crate::user::errors::UserError;
use crate::user::models::TwitterIdentity;
use crate::user::models::User;
use crate::user::ports::UserRepository;

pub const LINKED_MESSAGE: &str = "Twitter account linked";

/// Sign-in with Twitter, and linking of a Twitter identity to the current account.
pub struct TwitterStrategy<UR>
where
    UR: UserRepository + ?Sized,
{
    repository: Arc<UR>,
}

impl<UR> TwitterStrategy<UR>
where
    UR: UserRepository + ?Sized,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self { repository }
    }

    /// Handle a completed handshake.
    ///
    /// Without a current user the profile is resolved to an account (found or
    /// created). With one, the profile is linked to that user's record.
    pub async fn callback(
        &self,
        callback: TwitterCallback,
        current_user: Option<&User>,
    ) -> Result<AuthOutcome, AuthError> {
        match current_user {
            None => self.sign_in(callback).await,
            Some(user) => self.link(user, callback).await,
        }
    }

    async fn sign_in(&self, callback: TwitterCallback) -> Result<AuthOutcome, AuthError> {
        let twitter_id = callback.profile.id.clone();

        // Stored token and profile fields are left as they were on this path.
        if let Some(user) = self.repository.find_by_twitter_id(&twitter_id).await? {
            tracing::debug!(user_id = %user.id, twitter_id = %twitter_id, "Twitter sign-in for existing account");
            return Ok(AuthOutcome::authenticated(user));
        }

        let user = User::with_twitter(TwitterIdentity::from_profile(
            callback.profile,
            callback.token,
        ));

        match self.repository.create(user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, twitter_id = %twitter_id, "Twitter account created");
                Ok(AuthOutcome::authenticated(user))
            }
            Err(UserError::TwitterIdAlreadyLinked(_)) => {
                // A concurrent first sign-in won; hand back its record.
                self.repository
                    .find_by_twitter_id(&twitter_id)
                    .await?
                    .map(AuthOutcome::authenticated)
                    .ok_or_else(|| {
                        AuthError::Store(UserError::TwitterIdAlreadyLinked(twitter_id.to_string()))
                    })
            }
            Err(e) => {
                tracing::error!(error = %e, twitter_id = %twitter_id, "Failed to persist Twitter account");
                Err(e.into())
            }
        }
    }

    async fn link(
        &self,
        current_user: &User,
        callback: TwitterCallback,
    ) -> Result<AuthOutcome, AuthError> {
        let fresh = match current_user.local_username() {
            Some(username) => self.repository.find_by_local_username(username).await?,
            None => self.repository.find_by_id(&current_user.id).await?,
        };

        let Some(mut record) = fresh else {
            tracing::error!(user_id = %current_user.id, "Authenticated account missing from store during link");
            return Err(AuthError::LinkTargetMissing(current_user.id.to_string()));
        };

        let twitter_id = callback.profile.id.clone();
        if let Some(owner) = self.repository.find_by_twitter_id(&twitter_id).await? {
            if owner.id != record.id {
                tracing::warn!(
                    user_id = %record.id,
                    owner_id = %owner.id,
                    twitter_id = %twitter_id,
                    "Link rejected: Twitter account belongs to another user"
                );
                return Ok(Rejection::TwitterAccountTaken.into());
            }
        }

        record.link_twitter(TwitterIdentity::from_profile(
            callback.profile,
            callback.token,
        ));

        match self.repository.update(record).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, twitter_id = %twitter_id, "Twitter account linked");
                Ok(AuthOutcome::authenticated_with_message(user, LINKED_MESSAGE))
            }
            Err(UserError::TwitterIdAlreadyLinked(_)) => Ok(Rejection::TwitterAccountTaken.into()),
            Err(e) => {
                tracing::error!(error = %e, twitter_id = %twitter_id, "Failed to persist Twitter link");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl<UR> AuthenticationStrategy for TwitterStrategy<UR>
where
    UR: UserRepository + ?Sized,
{
    fn name(&self) -> &'static str {
        TWITTER
    }

    async fn authenticate(
        &self,
        credentials: Credentials,
        current_user: Option<&User>,
    ) -> Result<AuthOutcome, AuthError> {
        match credentials {
            Credentials::Twitter(callback) => self.callback(callback, current_user).await,
            other => Err(AuthError::UnsupportedCredentials {
                strategy: TWITTER,
                kind: other.kind(),
            }),
        }
    }
}
