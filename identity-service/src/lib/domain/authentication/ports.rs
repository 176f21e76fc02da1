use async_trait::async_trait;

use crate::authentication::errors::TwitterError;
use crate::authentication::models::TwitterCallback;

/// Where to send the browser to start a Twitter sign-in, plus the secrets
/// the callback must present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
}

/// OAuth handshake with Twitter.
#[async_trait]
pub trait TwitterGateway: Send + Sync + 'static {
    /// Build a fresh authorization redirect.
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchange the callback's authorization code for tokens and fetch the profile.
    ///
    /// # Errors
    /// * `TokenExchange` - Twitter rejected the code or was unreachable
    /// * `Profile` - The profile request failed
    /// * `InvalidProfile` - The profile lacked an id
    async fn complete(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TwitterCallback, TwitterError>;
}
