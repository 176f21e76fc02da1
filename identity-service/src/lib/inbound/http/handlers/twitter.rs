use axum::extract::Query;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use super::complete_authentication;
use super::PageError;
use super::PROFILE_PATH;
use crate::authentication::models::Credentials;
use crate::authentication::registry::TWITTER;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::CurrentUser;
use crate::inbound::http::session::Session;
use crate::session::models::FlashKind;
use crate::session::models::PendingOAuth;

pub const CANCELLED_MESSAGE: &str = "Twitter sign-in was cancelled";
pub const UNVERIFIED_MESSAGE: &str = "Twitter sign-in could not be verified, please try again";
pub const FAILED_MESSAGE: &str = "Twitter sign-in failed, please try again";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Redirect the browser to Twitter, remembering the handshake secrets.
pub async fn begin_twitter(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, PageError> {
    let gateway = state.twitter.as_ref().ok_or(PageError::NotFound)?;
    let request = gateway.authorization_request();

    session
        .begin_oauth(PendingOAuth {
            state: request.state,
            code_verifier: request.code_verifier,
        })
        .await;

    Ok(Redirect::to(&request.url))
}

/// Finish the handshake and sign in, or link the account when a user is
/// already logged in.
pub async fn twitter_callback(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(current_user): CurrentUser,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, PageError> {
    let gateway = state.twitter.as_ref().ok_or(PageError::NotFound)?;

    // Linking failures go back to the profile, sign-in failures to the login form.
    let (rejection_kind, retry_path) = match current_user {
        Some(_) => (FlashKind::Profile, PROFILE_PATH),
        None => (FlashKind::Login, "/login"),
    };

    let pending = session.take_oauth().await;

    if let Some(error) = query.error {
        tracing::info!(error = %error, "Twitter authorization was not granted");
        session.flash(rejection_kind, CANCELLED_MESSAGE).await;
        return Ok(Redirect::to(retry_path));
    }

    let (code, pending) = match (query.code, pending) {
        (Some(code), Some(pending)) if query.state.as_deref() == Some(pending.state.as_str()) => {
            (code, pending)
        }
        _ => {
            tracing::warn!("Twitter callback state did not match the session");
            session.flash(rejection_kind, UNVERIFIED_MESSAGE).await;
            return Ok(Redirect::to(retry_path));
        }
    };

    let callback = match gateway.complete(&code, &pending.code_verifier).await {
        Ok(callback) => callback,
        Err(e) => {
            tracing::error!(error = %e, "Twitter handshake failed");
            session.flash(rejection_kind, FAILED_MESSAGE).await;
            return Ok(Redirect::to(retry_path));
        }
    };

    let outcome = state
        .strategies
        .authenticate(TWITTER, Credentials::Twitter(callback), current_user.as_ref())
        .await?;

    Ok(complete_authentication(&state, &session, outcome, rejection_kind, retry_path).await)
}
