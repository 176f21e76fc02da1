use axum::response::Redirect;

use crate::inbound::http::session::Session;

pub async fn logout(session: Session) -> Redirect {
    session.log_out().await;
    Redirect::to("/")
}
