use std::sync::Arc;
use std::time::Duration;

use auth::PasswordHasher;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use config::ConfigError;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::index::index;
use super::handlers::login::login;
use super::handlers::login::login_form;
use super::handlers::logout::logout;
use super::handlers::not_found;
use super::handlers::render_error_pages;
use super::handlers::secret::secret;
use super::handlers::signup::signup;
use super::handlers::signup::signup_form;
use super::handlers::twitter::begin_twitter;
use super::handlers::twitter::twitter_callback;
use super::session::manage_session;
use super::views::ViewError;
use super::views::Views;
use crate::authentication::bridge::SessionIdentityBridge;
use crate::authentication::ports::TwitterGateway;
use crate::authentication::registry::StrategyRegistry;
use crate::config::Config;
use crate::session::ports::SessionStore;
use crate::user::ports::UserRepository;

/// Cookie and error page behavior of the HTTP layer.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cookie_name: String,
    pub session_ttl: chrono::Duration,
    pub secure_cookie: bool,
    pub show_error_details: bool,
}

impl TryFrom<&Config> for HttpSettings {
    type Error = ConfigError;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        Ok(Self {
            cookie_name: config.session.cookie_name.clone(),
            session_ttl: config.session.ttl()?,
            secure_cookie: config.session.secure_cookie,
            show_error_details: config.server.show_error_details,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub strategies: Arc<StrategyRegistry>,
    pub identities: Arc<SessionIdentityBridge<dyn UserRepository>>,
    pub sessions: Arc<dyn SessionStore>,
    pub twitter: Option<Arc<dyn TwitterGateway>>,
    pub views: Arc<Views>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    /// Wire the standard strategies and the identity bridge over `users`.
    ///
    /// # Errors
    /// * `ViewError` - A page template failed to compile
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        password_hasher: PasswordHasher,
        twitter: Option<Arc<dyn TwitterGateway>>,
        settings: HttpSettings,
    ) -> Result<Self, ViewError> {
        Ok(Self {
            strategies: Arc::new(StrategyRegistry::standard(
                Arc::clone(&users),
                password_hasher,
            )),
            identities: Arc::new(SessionIdentityBridge::new(users)),
            sessions,
            twitter,
            views: Arc::new(Views::new()?),
            settings: Arc::new(settings),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .route("/", get(index))
        .route("/signup", get(signup_form).post(signup))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/secret", get(secret))
        .route("/auth/twitter", get(begin_twitter))
        .route("/auth/twitter/callback", get(twitter_callback))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            manage_session,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            render_error_pages,
        ))
        .layer(trace_layer)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use axum::http::header;
    use axum::http::StatusCode;
    use chrono::Utc;
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::outbound::repositories::InMemorySessionStore;
    use crate::outbound::repositories::InMemoryUserRepository;
    use crate::session::models::SessionData;
    use crate::user::models::UserId;

    fn app() -> Router {
        app_with_sessions(Arc::new(InMemorySessionStore::new()))
    }

    fn app_with_sessions(sessions: Arc<InMemorySessionStore>) -> Router {
        let password_hasher = PasswordHasher::with_params(auth::PasswordParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();

        let state = AppState::new(
            Arc::new(InMemoryUserRepository::new()),
            sessions,
            password_hasher,
            None,
            HttpSettings {
                cookie_name: "sid".to_string(),
                session_ttl: chrono::Duration::hours(1),
                secure_cookie: true,
                show_error_details: false,
            },
        )
        .unwrap();
        create_router(state)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_fallback_renders_html_not_found() {
        let response = app().oneshot(get("/missing")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_twitter_routes_absent_without_gateway() {
        let response = app().oneshot(get("/auth/twitter")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_anonymous_visit_sets_no_cookie() {
        let response = app().oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_failed_login_sets_session_cookie() {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=ghost&password=pw"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("sid="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_session_for_deleted_user_is_anonymous() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let data = SessionData {
            user_id: Some(UserId::new().to_string()),
            ..SessionData::default()
        };
        sessions
            .save("stale", &data, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let request = Request::builder()
            .uri("/secret")
            .header(header::COOKIE, "sid=stale")
            .body(Body::empty())
            .unwrap();
        let response = app_with_sessions(Arc::clone(&sessions))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        let stored = sessions.load("stale").await.unwrap().unwrap();
        assert!(stored.user_id.is_none());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_request_logs_omit_query_string() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        app()
            .oneshot(get("/auth/twitter/callback?code=oauth-code&state=oauth-state"))
            .await
            .unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("/auth/twitter/callback"));
        assert!(!output.contains("oauth-code"));
        assert!(!output.contains("oauth-state"));
    }

    #[test]
    fn test_settings_reject_non_positive_ttl() {
        let mut config = Config::default();
        config.session.ttl_hours = 0;
        assert!(HttpSettings::try_from(&config).is_err());

        config.session.ttl_hours = 12;
        let settings = HttpSettings::try_from(&config).unwrap();
        assert_eq!(settings.session_ttl, chrono::Duration::hours(12));
    }
}
