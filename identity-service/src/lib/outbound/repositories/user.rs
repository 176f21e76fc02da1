use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::LocalIdentity;
use crate::domain::user::models::TwitterId;
use crate::domain::user::models::TwitterIdentity;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USERNAME_CONSTRAINT: &str = "users_local_username_key";
const TWITTER_ID_CONSTRAINT: &str = "users_twitter_id_key";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    local_username: Option<String>,
    local_password_hash: Option<String>,
    twitter_id: Option<String>,
    twitter_token: Option<String>,
    twitter_username: Option<String>,
    twitter_display_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let local = match (row.local_username, row.local_password_hash) {
            (Some(username), Some(password_hash)) => Some(LocalIdentity {
                username: Username::new(username)?,
                password_hash,
            }),
            _ => None,
        };

        let twitter = match row.twitter_id {
            Some(id) => Some(TwitterIdentity {
                id: TwitterId::new(id)?,
                token: row.twitter_token.unwrap_or_default(),
                username: row.twitter_username.unwrap_or_default(),
                display_name: row.twitter_display_name.unwrap_or_default(),
            }),
            None => None,
        };

        User::from_parts(UserId(row.id), local, twitter, row.created_at)
    }
}

/// Translate unique-index violations into domain errors.
fn write_error(e: sqlx::Error, user: &User) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => {
                    return UserError::UsernameAlreadyExists(
                        user.local_username()
                            .map(|username| username.to_string())
                            .unwrap_or_default(),
                    );
                }
                Some(TWITTER_ID_CONSTRAINT) => {
                    return UserError::TwitterIdAlreadyLinked(
                        user.twitter_id().map(|id| id.to_string()).unwrap_or_default(),
                    );
                }
                _ => {}
            }
        }
    }
    UserError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, local_username, local_password_hash,
                twitter_id, twitter_token, twitter_username, twitter_display_name,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.0)
        .bind(user.local.as_ref().map(|local| local.username.as_str()))
        .bind(user.local.as_ref().map(|local| local.password_hash.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.id.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.token.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.username.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.display_name.as_str()))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, local_username, local_password_hash,
                   twitter_id, twitter_token, twitter_username, twitter_display_name,
                   created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_local_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, local_username, local_password_hash,
                   twitter_id, twitter_token, twitter_username, twitter_display_name,
                   created_at
            FROM users
            WHERE local_username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_twitter_id(&self, twitter_id: &TwitterId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, local_username, local_password_hash,
                   twitter_id, twitter_token, twitter_username, twitter_display_name,
                   created_at
            FROM users
            WHERE twitter_id = $1
            "#,
        )
        .bind(twitter_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET local_username = $2,
                local_password_hash = $3,
                twitter_id = $4,
                twitter_token = $5,
                twitter_username = $6,
                twitter_display_name = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.local.as_ref().map(|local| local.username.as_str()))
        .bind(user.local.as_ref().map(|local| local.password_hash.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.id.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.token.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.username.as_str()))
        .bind(user.twitter.as_ref().map(|twitter| twitter.display_name.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }
}
