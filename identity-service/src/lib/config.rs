use std::env;

use auth::PasswordParams;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    pub twitter: Option<TwitterConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; may contain `{user}`, `{pword}` and `{db}` placeholders.
    /// Absent means the in-memory stores are used.
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            password: None,
            name: None,
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// The configured URL with credential placeholders filled in.
    pub fn connection_url(&self) -> Option<String> {
        let url = self.url.as_deref().filter(|url| !url.is_empty())?;

        let mut url = url.to_string();
        for (placeholder, value) in [
            ("{user}", &self.user),
            ("{pword}", &self.password),
            ("{db}", &self.name),
        ] {
            if let Some(value) = value {
                url = url.replace(placeholder, value);
            }
        }
        Some(url)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub http_port: u16,
    /// Render infrastructure error details on the error page.
    pub show_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 3000,
            show_error_details: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
    pub secure_cookie: bool,
}

impl SessionConfig {
    /// Lifetime of a session cookie and of its stored record.
    ///
    /// # Errors
    /// * `ConfigError::Message` - `ttl_hours` is not positive or out of range
    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if self.ttl_hours <= 0 {
            return Err(ConfigError::Message(format!(
                "session.ttl_hours must be positive, got {}",
                self.ttl_hours
            )));
        }

        chrono::Duration::try_hours(self.ttl_hours).ok_or_else(|| {
            ConfigError::Message(format!(
                "session.ttl_hours is out of range: {}",
                self.ttl_hours
            ))
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "identity.sid".to_string(),
            ttl_hours: 24 * 14,
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let params = PasswordParams::default();
        Self {
            memory_kib: params.memory_kib,
            iterations: params.iterations,
            parallelism: params.parallelism,
        }
    }
}

impl From<&PasswordConfig> for PasswordParams {
    fn from(config: &PasswordConfig) -> Self {
        PasswordParams {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TwitterConfig {
    pub client_id: String,
    /// Set for confidential clients only.
    pub client_secret: Option<String>,
    pub callback_url: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: TWITTER__CLIENT_ID=... sets twitter.client_id
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.session.ttl()?;
        Ok(config)
    }
}
