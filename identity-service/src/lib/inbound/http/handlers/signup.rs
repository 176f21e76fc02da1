use axum::extract::State;
use axum::response::Html;
use axum::response::Redirect;
use axum::Form;
use minijinja::context;
use serde::Deserialize;

use super::complete_authentication;
use super::PageError;
use crate::authentication::models::Credentials;
use crate::authentication::registry::LOCAL_SIGNUP;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::CurrentUser;
use crate::inbound::http::session::Session;
use crate::inbound::http::views::ProfileView;
use crate::session::models::FlashKind;

/// Username and password as posted by the signup and login forms.
///
/// Absent fields arrive as empty strings and are rejected as missing
/// credentials by the strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

impl From<CredentialsForm> for Credentials {
    fn from(form: CredentialsForm) -> Self {
        Credentials::Local {
            username: form.username,
            password: form.password,
        }
    }
}

pub async fn signup_form(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, PageError> {
    let messages = session.take_flash(FlashKind::Signup).await;
    let page = state.views.render(
        "signup.html",
        context! {
            user => user.as_ref().map(ProfileView::from),
            messages => messages,
        },
    )?;
    Ok(page)
}

pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, PageError> {
    let outcome = state
        .strategies
        .authenticate(LOCAL_SIGNUP, form.into(), None)
        .await?;

    Ok(complete_authentication(&state, &session, outcome, FlashKind::Signup, "/signup").await)
}
