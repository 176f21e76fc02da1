use thiserror::Error;

use crate::user::models::TwitterProfile;
use crate::user::models::User;

/// Input handed to a strategy.
#[derive(Debug, Clone)]
pub enum Credentials {
    Local { username: String, password: String },
    Twitter(TwitterCallback),
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Local { .. } => "local",
            Credentials::Twitter(_) => "twitter",
        }
    }
}

/// Result of a completed Twitter handshake.
#[derive(Debug, Clone)]
pub struct TwitterCallback {
    pub token: String,
    /// Refresh token, when the provider issued one. Not persisted.
    pub token_secret: Option<String>,
    pub profile: TwitterProfile,
}

/// Why a request was turned away. The display text is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Sorry, username already taken")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("That Twitter account is already linked to another user")]
    TwitterAccountTaken,
}

/// Outcome of a strategy that did not fail on infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated {
        user: User,
        message: Option<String>,
    },
    Rejected(Rejection),
}

impl AuthOutcome {
    pub fn authenticated(user: User) -> Self {
        AuthOutcome::Authenticated {
            user,
            message: None,
        }
    }

    pub fn authenticated_with_message(user: User, message: impl Into<String>) -> Self {
        AuthOutcome::Authenticated {
            user,
            message: Some(message.into()),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthOutcome::Authenticated { user, .. } => Some(user),
            AuthOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            AuthOutcome::Authenticated { .. } => None,
            AuthOutcome::Rejected(rejection) => Some(*rejection),
        }
    }
}

impl From<Rejection> for AuthOutcome {
    fn from(rejection: Rejection) -> Self {
        AuthOutcome::Rejected(rejection)
    }
}
