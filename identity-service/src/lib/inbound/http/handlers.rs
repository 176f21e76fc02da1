use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use minijinja::context;

use super::router::AppState;
use super::session::Session;
use super::views::ViewError;
use crate::authentication::errors::AuthError;
use crate::authentication::models::AuthOutcome;
use crate::session::errors::SessionError;
use crate::session::models::FlashKind;
use crate::user::errors::UserError;

pub mod index;
pub mod login;
pub mod logout;
pub mod secret;
pub mod signup;
pub mod twitter;

/// Where every successful authentication lands.
pub const PROFILE_PATH: &str = "/secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    NotFound,
    BadRequest(String),
    InternalServerError(String),
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::NotFound => StatusCode::NOT_FOUND,
            PageError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PageError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            PageError::NotFound => "Not Found",
            PageError::BadRequest(_) => "Bad Request",
            PageError::InternalServerError(_) => "Something went wrong",
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        if let PageError::InternalServerError(message) = &self {
            tracing::error!(error = %message, "Request failed");
        }

        // Plain body; `render_error_pages` swaps in the HTML page.
        let mut response = (self.status(), self.title()).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<AuthError> for PageError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UnsupportedCredentials { .. } => PageError::BadRequest(err.to_string()),
            _ => PageError::InternalServerError(err.to_string()),
        }
    }
}

impl From<UserError> for PageError {
    fn from(err: UserError) -> Self {
        PageError::InternalServerError(err.to_string())
    }
}

impl From<SessionError> for PageError {
    fn from(err: SessionError) -> Self {
        PageError::InternalServerError(err.to_string())
    }
}

impl From<ViewError> for PageError {
    fn from(err: ViewError) -> Self {
        PageError::InternalServerError(err.to_string())
    }
}

pub async fn not_found() -> PageError {
    PageError::NotFound
}

/// Replace the body of any `PageError` response with the rendered error page.
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let Some(error) = response.extensions().get::<PageError>().cloned() else {
        return response;
    };

    let details = match &error {
        PageError::BadRequest(details) => Some(details.clone()),
        PageError::InternalServerError(details) if state.settings.show_error_details => {
            Some(details.clone())
        }
        _ => None,
    };

    let page = state.views.render(
        "error.html",
        context! {
            status => error.status().as_u16(),
            title => error.title(),
            details => details,
        },
    );

    match page {
        Ok(page) => {
            // Keep headers such as the session cookie.
            let (mut parts, _) = response.into_parts();
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            Response::from_parts(parts, Body::from(page.0))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error page");
            response
        }
    }
}

/// Finish a strategy run: log the user in, or flash the rejection and send
/// them back to `retry_path`.
pub(crate) async fn complete_authentication(
    state: &AppState,
    session: &Session,
    outcome: AuthOutcome,
    rejection_kind: FlashKind,
    retry_path: &str,
) -> Redirect {
    match outcome {
        AuthOutcome::Authenticated { user, message } => {
            session.log_in(state.identities.serialize(&user)).await;
            if let Some(message) = message {
                session.flash(FlashKind::Profile, message).await;
            }
            Redirect::to(PROFILE_PATH)
        }
        AuthOutcome::Rejected(rejection) => {
            session.flash(rejection_kind, rejection.to_string()).await;
            Redirect::to(retry_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_error_status() {
        assert_eq!(PageError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            PageError::from(UserError::DatabaseError("down".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_page_error_marks_response() {
        let response = PageError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.extensions().get::<PageError>(),
            Some(&PageError::BadRequest("nope".to_string()))
        );
    }

    #[test]
    fn test_unsupported_credentials_is_bad_request() {
        let err = AuthError::UnsupportedCredentials {
            strategy: "twitter",
            kind: "local",
        };
        assert_eq!(PageError::from(err).status(), StatusCode::BAD_REQUEST);
    }
}
