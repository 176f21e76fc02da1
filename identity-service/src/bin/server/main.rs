use std::sync::Arc;
use std::time::Duration;

use auth::PasswordHasher;
use identity_service::authentication::ports::TwitterGateway;
use identity_service::config::Config;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::inbound::http::router::HttpSettings;
use identity_service::outbound::repositories::InMemorySessionStore;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::outbound::repositories::PostgresSessionStore;
use identity_service::outbound::repositories::PostgresUserRepository;
use identity_service::outbound::twitter::TwitterOAuthClient;
use identity_service::session::ports::SessionStore;
use identity_service::user::ports::UserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        twitter_enabled = config.twitter.is_some(),
        show_error_details = config.server.show_error_details,
        "Configuration loaded"
    );

    let (users, sessions): (Arc<dyn UserRepository>, Arc<dyn SessionStore>) =
        match config.database.connection_url() {
            Some(url) => {
                let pg_pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .connect(&url)
                    .await?;
                tracing::info!(
                    max_connections = config.database.max_connections,
                    database = "postgresql",
                    "Database connection pool created"
                );

                sqlx::migrate!("./migrations").run(&pg_pool).await?;
                tracing::info!(database = "postgresql", "Database migrations completed");

                let users: Arc<dyn UserRepository> =
                    Arc::new(PostgresUserRepository::new(pg_pool.clone()));
                let sessions: Arc<dyn SessionStore> = Arc::new(PostgresSessionStore::new(pg_pool));
                (users, sessions)
            }
            None => {
                tracing::warn!(
                    database = "memory",
                    "No database configured, accounts and sessions will not survive a restart"
                );
                let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
                let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
                (users, sessions)
            }
        };

    let password_hasher = PasswordHasher::with_params((&config.password).into())?;

    let twitter: Option<Arc<dyn TwitterGateway>> = match &config.twitter {
        Some(twitter_config) => Some(Arc::new(TwitterOAuthClient::new(twitter_config)?)),
        None => None,
    };

    let state = AppState::new(
        users,
        Arc::clone(&sessions),
        password_hasher,
        twitter,
        HttpSettings::try_from(&config)?,
    )?;

    tokio::spawn(purge_expired_sessions(sessions));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");
    Ok(())
}

async fn purge_expired_sessions(sessions: Arc<dyn SessionStore>) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match sessions.purge_expired().await {
            Ok(purged) => tracing::debug!(purged, "Expired sessions purged"),
            Err(e) => tracing::error!(error = %e, "Failed to purge expired sessions"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
