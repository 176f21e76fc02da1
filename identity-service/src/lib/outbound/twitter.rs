//! Twitter OAuth 2.0 authorization code flow with PKCE.

use std::time::Duration;

use async_trait::async_trait;
use auth::generate_state;
use auth::PkceChallenge;
use reqwest::Client;
use serde::Deserialize;

use crate::authentication::errors::TwitterError;
use crate::authentication::models::TwitterCallback;
use crate::authentication::ports::AuthorizationRequest;
use crate::authentication::ports::TwitterGateway;
use crate::config::TwitterConfig;
use crate::user::models::TwitterId;
use crate::user::models::TwitterProfile;

const AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";
const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
const ME_URL: &str = "https://api.twitter.com/2/users/me";
const SCOPES: &str = "tweet.read users.read offline.access";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct MeResponse {
    data: MeData,
}

#[derive(Deserialize)]
struct MeData {
    id: String,
    name: String,
    username: String,
}

pub struct TwitterOAuthClient {
    client_id: String,
    client_secret: Option<String>,
    callback_url: String,
    http: Client,
}

impl TwitterOAuthClient {
    /// Create a client for the configured Twitter application.
    ///
    /// # Errors
    /// * `Client` - The HTTP client could not be built
    pub fn new(config: &TwitterConfig) -> Result<Self, TwitterError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TwitterError::Client(e.to_string()))?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone().filter(|s| !s.is_empty()),
            callback_url: config.callback_url.clone(),
            http,
        })
    }

    fn authorize_url(&self, state: &str, challenge: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
            challenge,
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, TwitterError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];

        let mut request = self.http.post(TOKEN_URL).form(&params);
        if let Some(secret) = &self.client_secret {
            request = request.basic_auth(&self.client_id, Some(secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TwitterError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Twitter token exchange failed");
            return Err(TwitterError::TokenExchange(format!("{}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| TwitterError::TokenExchange(e.to_string()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<TwitterProfile, TwitterError> {
        let response = self
            .http
            .get(ME_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| TwitterError::Profile(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(%status, "Twitter profile request failed");
            return Err(TwitterError::Profile(status.to_string()));
        }

        let me: MeResponse = response
            .json()
            .await
            .map_err(|e| TwitterError::Profile(e.to_string()))?;

        Ok(TwitterProfile {
            id: TwitterId::new(me.data.id)
                .map_err(|e| TwitterError::InvalidProfile(e.to_string()))?,
            username: me.data.username,
            display_name: me.data.name,
        })
    }
}

#[async_trait]
impl TwitterGateway for TwitterOAuthClient {
    fn authorization_request(&self) -> AuthorizationRequest {
        let pkce = PkceChallenge::generate();
        let state = generate_state();

        AuthorizationRequest {
            url: self.authorize_url(&state, &pkce.challenge),
            state,
            code_verifier: pkce.verifier,
        }
    }

    async fn complete(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TwitterCallback, TwitterError> {
        let tokens = self.exchange_code(code, code_verifier).await?;
        let profile = self.fetch_profile(&tokens.access_token).await?;

        tracing::info!(twitter_id = %profile.id, "Completed Twitter handshake");

        Ok(TwitterCallback {
            token: tokens.access_token,
            token_secret: tokens.refresh_token,
            profile,
        })
    }
}
