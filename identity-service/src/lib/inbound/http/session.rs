use std::sync::Arc;

use auth::generate_session_token;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;
use chrono::Duration;
use chrono::Utc;
use tokio::sync::Mutex;

use super::handlers::PageError;
use super::router::AppState;
use super::router::HttpSettings;
use crate::session::errors::SessionError;
use crate::session::models::FlashKind;
use crate::session::models::PendingOAuth;
use crate::session::models::SessionData;
use crate::session::ports::SessionStore;
use crate::user::models::User;

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    data: SessionData,
    loaded: bool,
    modified: bool,
    /// Tokens retired by regeneration, destroyed on commit.
    retired: Vec<String>,
}

impl SessionState {
    fn regenerate(&mut self) {
        if let Some(token) = self.token.take() {
            self.retired.push(token);
        }
        self.modified = true;
    }
}

/// The request's server-side session.
///
/// Changes are written back by `manage_session` after the handler returns.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// A session backed by `token`, or a fresh one when nothing was loaded.
    pub fn resume(token: String, data: SessionData) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                token: Some(token),
                data,
                loaded: true,
                ..SessionState::default()
            })),
        }
    }

    pub async fn user_id(&self) -> Option<String> {
        self.state.lock().await.data.user_id.clone()
    }

    /// Bind the session to `user_id` under a new token.
    pub async fn log_in(&self, user_id: String) {
        let mut state = self.state.lock().await;
        state.regenerate();
        state.data.user_id = Some(user_id);
    }

    pub async fn log_out(&self) {
        let mut state = self.state.lock().await;
        state.regenerate();
        state.data.user_id = None;
    }

    /// Drop a user id that no longer resolves to a record.
    async fn forget_user(&self) {
        let mut state = self.state.lock().await;
        state.data.user_id = None;
        state.modified = true;
    }

    pub async fn flash(&self, kind: FlashKind, message: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.data.push_flash(kind, message);
        state.modified = true;
    }

    pub async fn take_flash(&self, kind: FlashKind) -> Vec<String> {
        let mut state = self.state.lock().await;
        let messages = state.data.take_flash(kind);
        if !messages.is_empty() {
            state.modified = true;
        }
        messages
    }

    pub async fn begin_oauth(&self, pending: PendingOAuth) {
        let mut state = self.state.lock().await;
        state.data.pending_oauth = Some(pending);
        state.modified = true;
    }

    pub async fn take_oauth(&self) -> Option<PendingOAuth> {
        let mut state = self.state.lock().await;
        let pending = state.data.pending_oauth.take();
        if pending.is_some() {
            state.modified = true;
        }
        pending
    }

    /// Write the session back to `store`.
    ///
    /// # Returns
    /// The token the client should hold, or `None` when the session was
    /// neither loaded nor modified and so was never persisted.
    pub async fn commit(
        &self,
        store: &dyn SessionStore,
        ttl: Duration,
    ) -> Result<Option<String>, SessionError> {
        let (retired, pending_save) = {
            let mut state = self.state.lock().await;
            let retired = std::mem::take(&mut state.retired);
            let pending_save = if state.loaded || state.modified {
                let token = state
                    .token
                    .get_or_insert_with(generate_session_token)
                    .clone();
                Some((token, state.data.clone()))
            } else {
                None
            };
            (retired, pending_save)
        };

        for token in retired {
            store.destroy(&token).await?;
        }

        match pending_save {
            Some((token, data)) => {
                store.save(&token, &data, Utc::now() + ttl).await?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            PageError::InternalServerError("session layer is not installed".to_string())
        })
    }
}

/// User resolved from the session, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

fn session_cookie(settings: &HttpSettings, token: String) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(settings.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(settings.session_ttl.num_seconds()))
        .build()
}

/// Middleware that loads the session named by the cookie, resolves the
/// current user and saves the session once the handler has run.
pub async fn manage_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<(CookieJar, Response), PageError> {
    let settings = Arc::clone(&state.settings);
    let incoming = jar
        .get(&settings.cookie_name)
        .map(|cookie| cookie.value().to_string());

    let session = match incoming.clone() {
        Some(token) => match state.sessions.load(&token).await? {
            Some(data) => Session::resume(token, data),
            None => Session::default(),
        },
        None => Session::default(),
    };

    let current_user = match session.user_id().await {
        Some(id) => {
            let user = state.identities.deserialize(&id).await?;
            if user.is_none() {
                tracing::info!(session_user_id = %id, "Session user no longer exists");
                session.forget_user().await;
            }
            user
        }
        None => None,
    };

    request.extensions_mut().insert(session.clone());
    request.extensions_mut().insert(CurrentUser(current_user));

    let response = next.run(request).await;

    let jar = match session
        .commit(state.sessions.as_ref(), settings.session_ttl)
        .await?
    {
        Some(token) => jar.add(session_cookie(&settings, token)),
        None if incoming.is_some() => {
            jar.remove(Cookie::build((settings.cookie_name.clone(), "")).path("/"))
        }
        None => jar,
    };

    Ok((jar, response))
}
