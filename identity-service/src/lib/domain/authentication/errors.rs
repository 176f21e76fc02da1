use auth::PasswordError;
use thiserror::Error;

use crate::user::errors::UserError;

/// Infrastructure failure during an authentication flow.
///
/// User-facing rejections are not errors; see `AuthOutcome::Rejected`.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("User store error: {0}")]
    Store(#[from] UserError),

    #[error("Credential error: {0}")]
    Credential(#[from] PasswordError),

    #[error("Account {0} disappeared while linking a Twitter identity")]
    LinkTargetMissing(String),

    #[error("Unknown authentication strategy: {0}")]
    UnknownStrategy(String),

    #[error("Strategy {strategy} does not accept {kind} credentials")]
    UnsupportedCredentials {
        strategy: &'static str,
        kind: &'static str,
    },
}

/// Error for the Twitter OAuth handshake
#[derive(Debug, Clone, Error)]
pub enum TwitterError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Profile request failed: {0}")]
    Profile(String),

    #[error("Twitter returned an invalid profile: {0}")]
    InvalidProfile(String),
}
