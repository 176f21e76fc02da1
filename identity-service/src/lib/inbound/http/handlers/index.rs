use axum::extract::State;
use axum::response::Html;
use minijinja::context;

use super::PageError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::CurrentUser;
use crate::inbound::http::views::ProfileView;

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, PageError> {
    let page = state.views.render(
        "index.html",
        context! {
            user => user.as_ref().map(ProfileView::from),
            twitter_enabled => state.twitter.is_some(),
        },
    )?;
    Ok(page)
}
