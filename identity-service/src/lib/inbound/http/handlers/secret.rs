use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use minijinja::context;

use super::PageError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::CurrentUser;
use crate::inbound::http::session::Session;
use crate::inbound::http::views::ProfileView;
use crate::session::models::FlashKind;

/// Profile page; anonymous visitors are sent to the login form.
pub async fn secret(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response, PageError> {
    let Some(user) = user else {
        return Ok(Redirect::to("/login").into_response());
    };

    let messages = session.take_flash(FlashKind::Profile).await;
    let page = state.views.render(
        "secret.html",
        context! {
            user => ProfileView::from(&user),
            messages => messages,
            twitter_enabled => state.twitter.is_some(),
        },
    )?;
    Ok(page.into_response())
}
