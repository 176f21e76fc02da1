use axum::extract::State;
use axum::response::Html;
use axum::response::Redirect;
use axum::Form;
use minijinja::context;

use super::complete_authentication;
use super::signup::CredentialsForm;
use super::PageError;
use crate::authentication::registry::LOCAL_LOGIN;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::CurrentUser;
use crate::inbound::http::session::Session;
use crate::inbound::http::views::ProfileView;
use crate::session::models::FlashKind;

pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, PageError> {
    let messages = session.take_flash(FlashKind::Login).await;
    let page = state.views.render(
        "login.html",
        context! {
            user => user.as_ref().map(ProfileView::from),
            messages => messages,
            twitter_enabled => state.twitter.is_some(),
        },
    )?;
    Ok(page)
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, PageError> {
    let outcome = state
        .strategies
        .authenticate(LOCAL_LOGIN, form.into(), None)
        .await?;

    Ok(complete_authentication(&state, &session, outcome, FlashKind::Login, "/login").await)
}
