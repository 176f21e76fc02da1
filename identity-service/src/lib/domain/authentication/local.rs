use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;

use crate::authentication::errors::AuthError;
use crate::authentication::models::AuthOutcome;
use crate::authentication::models::Credentials;
use crate::authentication::models::Rejection;
use crate::authentication::registry::AuthenticationStrategy;
use crate::authentication::registry::LOCAL_LOGIN;
use crate::authentication::registry::LOCAL_SIGNUP;
use crate::user::errors::UserError;
use crate::user::models::LocalIdentity;
use crate::user::models::User;
use crate::user::models::Username;
use crate::user::ports::UserRepository;

/// Username/password signup and login.
pub struct LocalStrategy<UR>
where
    UR: UserRepository + ?Sized,
{
    repository: Arc<UR>,
    password_hasher: PasswordHasher,
}

impl<UR> LocalStrategy<UR>
where
    UR: UserRepository + ?Sized,
{
    pub fn new(repository: Arc<UR>, password_hasher: PasswordHasher) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    /// Create a local account.
    ///
    /// # Returns
    /// The new user, or `UsernameTaken` when the name is in use
    ///
    /// # Errors
    /// * `Store` - Lookup or insert failed
    /// * `Credential` - Password hashing failed
    pub async fn signup(&self, username: &str, password: &str) -> Result<AuthOutcome, AuthError> {
        let Some(username) = required(username, password) else {
            return Ok(Rejection::MissingCredentials.into());
        };

        if self
            .repository
            .find_by_local_username(&username)
            .await?
            .is_some()
        {
            tracing::info!(username = %username, "Signup rejected: username already taken");
            return Ok(Rejection::UsernameTaken.into());
        }

        let password_hash = self.password_hasher.hash(password)?;
        let user = User::with_local(LocalIdentity {
            username,
            password_hash,
        });

        match self.repository.create(user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Local account created");
                Ok(AuthOutcome::authenticated(user))
            }
            // Another signup for the same name committed between our lookup and insert.
            Err(UserError::UsernameAlreadyExists(username)) => {
                tracing::warn!(username = %username, "Signup lost a race for username");
                Ok(Rejection::UsernameTaken.into())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist new local account");
                Err(e.into())
            }
        }
    }

    /// Check a username/password pair.
    ///
    /// # Returns
    /// The existing user, `UserNotFound`, or `WrongPassword`
    ///
    /// # Errors
    /// * `Store` - Lookup failed
    /// * `Credential` - Stored hash is malformed
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthOutcome, AuthError> {
        let Some(username) = required(username, password) else {
            return Ok(Rejection::MissingCredentials.into());
        };

        let Some(user) = self.repository.find_by_local_username(&username).await? else {
            tracing::info!(username = %username, "Login rejected: user not found");
            return Ok(Rejection::UserNotFound.into());
        };

        let Some(local) = user.local.as_ref() else {
            return Ok(Rejection::WrongPassword.into());
        };

        if !self.password_hasher.verify(password, &local.password_hash)? {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Ok(Rejection::WrongPassword.into());
        }

        Ok(AuthOutcome::authenticated(user))
    }
}

fn required(username: &str, password: &str) -> Option<Username> {
    if password.is_empty() {
        return None;
    }
    Username::new(username.to_string()).ok()
}

/// `local-signup` entry of the registry.
pub struct LocalSignup<UR>(pub Arc<LocalStrategy<UR>>)
where
    UR: UserRepository + ?Sized;

/// `local-login` entry of the registry.
pub struct LocalLogin<UR>(pub Arc<LocalStrategy<UR>>)
where
    UR: UserRepository + ?Sized;

#[async_trait]
impl<UR> AuthenticationStrategy for LocalSignup<UR>
where
    UR: UserRepository + ?Sized,
{
    fn name(&self) -> &'static str {
        LOCAL_SIGNUP
    }

    async fn authenticate(
        &self,
        credentials: Credentials,
        _current_user: Option<&User>,
    ) -> Result<AuthOutcome, AuthError> {
        match credentials {
            Credentials::Local { username, password } => self.0.signup(&username, &password).await,
            other => Err(AuthError::UnsupportedCredentials {
                strategy: LOCAL_SIGNUP,
                kind: other.kind(),
            }),
        }
    }
}

#[async_trait]
impl<UR> AuthenticationStrategy for LocalLogin<UR>
where
    UR: UserRepository + ?Sized,
{
    fn name(&self) -> &'static str {
        LOCAL_LOGIN
    }

    async fn authenticate(
        &self,
        credentials: Credentials,
        _current_user: Option<&User>,
    ) -> Result<AuthOutcome, AuthError> {
        match credentials {
            Credentials::Local { username, password } => self.0.login(&username, &password).await,
            other => Err(AuthError::UnsupportedCredentials {
                strategy: LOCAL_LOGIN,
                kind: other.kind(),
            }),
        }
    }
}
