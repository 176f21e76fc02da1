use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;

use crate::authentication::errors::AuthError;
use crate::authentication::local::LocalLogin;
use crate::authentication::local::LocalSignup;
use crate::authentication::local::LocalStrategy;
use crate::authentication::models::AuthOutcome;
use crate::authentication::models::Credentials;
use crate::authentication::twitter::TwitterStrategy;
use crate::user::models::User;
use crate::user::ports::UserRepository;

pub const LOCAL_SIGNUP: &str = "local-signup";
pub const LOCAL_LOGIN: &str = "local-login";
pub const TWITTER: &str = "twitter";

/// A named authentication flow.
#[async_trait]
pub trait AuthenticationStrategy: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Run the flow.
    ///
    /// # Arguments
    /// * `credentials` - What the user presented
    /// * `current_user` - User already authenticated on this session, if any
    ///
    /// # Errors
    /// Infrastructure failures only; rejections are `Ok(AuthOutcome::Rejected)`.
    async fn authenticate(
        &self,
        credentials: Credentials,
        current_user: Option<&User>,
    ) -> Result<AuthOutcome, AuthError>;
}

/// Strategies available to the request router, looked up by name.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn AuthenticationStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `local-signup`, `local-login` and `twitter` over one store.
    pub fn standard<UR>(repository: Arc<UR>, password_hasher: PasswordHasher) -> Self
    where
        UR: UserRepository + ?Sized,
    {
        let local = Arc::new(LocalStrategy::new(Arc::clone(&repository), password_hasher));

        Self::new()
            .register(LocalSignup(Arc::clone(&local)))
            .register(LocalLogin(local))
            .register(TwitterStrategy::new(repository))
    }

    /// Add a strategy, replacing any registered under the same name.
    pub fn register<S>(mut self, strategy: S) -> Self
    where
        S: AuthenticationStrategy,
    {
        self.strategies.insert(strategy.name(), Arc::new(strategy));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthenticationStrategy>> {
        self.strategies.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.strategies.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run the strategy registered under `name`.
    ///
    /// # Errors
    /// * `UnknownStrategy` - Nothing is registered under `name`
    /// * Whatever the strategy itself reports
    pub async fn authenticate(
        &self,
        name: &str,
        credentials: Credentials,
        current_user: Option<&User>,
    ) -> Result<AuthOutcome, AuthError> {
        let strategy = self
            .get(name)
            .ok_or_else(|| AuthError::UnknownStrategy(name.to_string()))?;

        tracing::debug!(strategy = name, credentials = credentials.kind(), "Running authentication strategy");
        strategy.authenticate(credentials, current_user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::models::Rejection;
    use crate::user::ports::mocks::MockTestUserRepository;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(auth::PasswordParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_standard_registry_names() {
        let registry =
            StrategyRegistry::standard(Arc::new(MockTestUserRepository::new()), hasher());
        assert_eq!(registry.names(), vec![LOCAL_LOGIN, LOCAL_SIGNUP, TWITTER]);
    }

    #[tokio::test]
    async fn test_unknown_strategy() {
        let registry = StrategyRegistry::new();
        let result = registry
            .authenticate(
                "facebook",
                Credentials::Local {
                    username: "alice".to_string(),
                    password: "pw".to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(AuthError::UnknownStrategy(name)) if name == "facebook"));
    }

    #[tokio::test]
    async fn test_dispatches_by_name() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_local_username()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_create().times(0);

        let registry = StrategyRegistry::standard(Arc::new(repository), hasher());
        let outcome = registry
            .authenticate(
                LOCAL_LOGIN,
                Credentials::Local {
                    username: "ghost".to_string(),
                    password: "pw".to_string(),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.rejection(), Some(Rejection::UserNotFound));
    }

    #[tokio::test]
    async fn test_works_over_trait_object_store() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_local_username()
            .times(1)
            .returning(|_| Ok(None));

        let repository: Arc<dyn UserRepository> = Arc::new(repository);
        let registry = StrategyRegistry::standard(repository, hasher());
        let outcome = registry
            .authenticate(
                LOCAL_LOGIN,
                Credentials::Local {
                    username: "ghost".to_string(),
                    password: "pw".to_string(),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.rejection(), Some(Rejection::UserNotFound));
    }
}
