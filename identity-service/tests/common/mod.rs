use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::PasswordParams;
use identity_service::authentication::errors::TwitterError;
use identity_service::authentication::models::TwitterCallback;
use identity_service::authentication::ports::AuthorizationRequest;
use identity_service::authentication::ports::TwitterGateway;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::inbound::http::router::HttpSettings;
use identity_service::outbound::repositories::InMemorySessionStore;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::user::models::TwitterId;
use identity_service::user::models::TwitterProfile;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;

pub const FAILING_CODE: &str = "fail";

/// Twitter stand-in: the authorization code is taken as the profile id.
pub struct FakeTwitterGateway;

#[async_trait]
impl TwitterGateway for FakeTwitterGateway {
    fn authorization_request(&self) -> AuthorizationRequest {
        let state = auth::generate_state();
        AuthorizationRequest {
            url: format!("https://twitter.test/i/oauth2/authorize?state={}", state),
            code_verifier: format!("verifier-{}", state),
            state,
        }
    }

    async fn complete(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TwitterCallback, TwitterError> {
        if code == FAILING_CODE {
            return Err(TwitterError::TokenExchange("invalid_grant".to_string()));
        }
        assert!(code_verifier.starts_with("verifier-"));

        Ok(TwitterCallback {
            token: format!("token-{}", code),
            token_secret: None,
            profile: TwitterProfile {
                id: TwitterId::new(code.to_string())
                    .map_err(|e| TwitterError::InvalidProfile(e.to_string()))?,
                username: format!("user_{}", code),
                display_name: format!("Bird {}", code),
            },
        })
    }
}

/// Test application that spawns a real server over in-memory stores
pub struct TestApp {
    pub address: String,
    pub users: Arc<InMemoryUserRepository>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(InMemoryUserRepository::new());
        let password_hasher = PasswordHasher::with_params(PasswordParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to build password hasher");

        let state = AppState::new(
            users.clone(),
            Arc::new(InMemorySessionStore::new()),
            password_hasher,
            Some(Arc::new(FakeTwitterGateway)),
            HttpSettings {
                cookie_name: "identity.sid".to_string(),
                session_ttl: chrono::Duration::hours(1),
                secure_cookie: false,
                show_error_details: true,
            },
        )
        .expect("Failed to build application state");

        let router = create_router(state);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            users,
            api_client: Self::client(),
        }
    }

    /// A browser with its own cookie jar. Redirects are not followed.
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create reqwest client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(self.url(path))
    }

    /// GET `path` and return the body.
    pub async fn page(&self, client: &reqwest::Client, path: &str) -> String {
        client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
            .text()
            .await
            .expect("Failed to read body")
    }

    pub async fn signup(
        &self,
        client: &reqwest::Client,
        username: &str,
        password: &str,
    ) -> reqwest::Response {
        client
            .post(self.url("/signup"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(
        &self,
        client: &reqwest::Client,
        username: &str,
        password: &str,
    ) -> reqwest::Response {
        client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Run the whole Twitter handshake for the profile `twitter_id`.
    pub async fn twitter_sign_in(
        &self,
        client: &reqwest::Client,
        twitter_id: &str,
    ) -> reqwest::Response {
        let begin = client
            .get(self.url("/auth/twitter"))
            .send()
            .await
            .expect("Failed to execute request");
        let authorize_url = location(&begin);
        let state = authorize_url
            .split("state=")
            .nth(1)
            .expect("Authorization URL carries no state")
            .to_string();

        client
            .get(self.url("/auth/twitter/callback"))
            .query(&[("code", twitter_id), ("state", state.as_str())])
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// The redirect target of `response`.
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .expect("Response is not a redirect")
        .to_str()
        .expect("Location is not a string")
        .to_string()
}

/// Throwaway Postgres database, migrated, created on the server named by
/// `DATABASE__URL` and dropped again afterwards.
pub struct TestDb {
    pub pool: PgPool,
    pub db_name: String,
}

fn postgres_url() -> String {
    std::env::var("DATABASE__URL").expect("DATABASE__URL must point at a Postgres server")
}

impl TestDb {
    /// Create a new test database with a unique name
    pub async fn new() -> Self {
        let db_name = format!(
            "test_identity_service_{}",
            uuid::Uuid::new_v4().to_string().replace('-', "_")
        );

        let postgres_url = postgres_url();
        let mut conn = PgConnection::connect(&postgres_url)
            .await
            .expect("Failed to connect to Postgres");

        conn.execute(format!(r#"CREATE DATABASE "{}";"#, db_name).as_str())
            .await
            .expect("Failed to create test database");

        let options = postgres_url
            .parse::<PgConnectOptions>()
            .expect("Failed to parse DATABASE__URL")
            .database(&db_name);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool, db_name }
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        // Database cleanup happens asynchronously
        let db_name = self.db_name.clone();
        tokio::spawn(async move {
            if let Ok(mut conn) = PgConnection::connect(&postgres_url()).await {
                let _ = conn
                    .execute(
                        format!(
                            r#"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}';"#,
                            db_name
                        )
                        .as_str(),
                    )
                    .await;

                let _ = conn
                    .execute(format!(r#"DROP DATABASE IF EXISTS "{}";"#, db_name).as_str())
                    .await;
            }
        });
    }
}
