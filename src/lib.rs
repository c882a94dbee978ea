pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod session;
pub mod startup;
pub mod store;
pub mod web;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;
use std::time::Instant;

use crate::api::AuthorizationPolicies;
use crate::auth::TokenIssuer;
use crate::client::CatalogClient;
use crate::session::SessionStore;
use crate::store::ProductStore;

/// Shared state of the catalog API server.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProductStore>,
    pub tokens: TokenIssuer,
    pub policies: AuthorizationPolicies,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ProductStore>, tokens: TokenIssuer) -> Self {
        Self {
            config,
            store,
            tokens,
            policies: AuthorizationPolicies::default(),
            started_at: Instant::now(),
        }
    }

    /// Replace the default operation-to-role bindings
    pub fn with_policies(mut self, policies: AuthorizationPolicies) -> Self {
        self.policies = policies;
        self
    }
}

/// Shared state of the web front-end.
pub struct WebState {
    pub config: Config,
    pub client: CatalogClient,
    pub sessions: Arc<dyn SessionStore>,
}

impl WebState {
    pub fn new(config: Config, client: CatalogClient, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            client,
            sessions,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::{Principal, Role, StaticCredentials};
    use crate::config::{DatabaseConfig, JwtConfig};
    use crate::db::Product;
    use crate::store::SqliteProductStore;
    use rust_decimal::Decimal;

    pub(crate) fn jwt_config() -> JwtConfig {
        JwtConfig {
            issuer: "catalog-api".to_string(),
            audience: "catalog-clients".to_string(),
            secret_key: "test-secret-key-that-is-at-least-32-bytes".to_string(),
            expiry_minutes: 30,
        }
    }

    pub(crate) fn token_issuer() -> TokenIssuer {
        TokenIssuer::new(
            &jwt_config(),
            Arc::new(StaticCredentials::new("admin", "password", Role::Admin)),
        )
    }

    /// In-memory store holding exactly Product1 and Product2.
    pub(crate) async fn seeded_store() -> SqliteProductStore {
        let pool = crate::db::init(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap();

        sqlx::query("DELETE FROM products").execute(&pool).await.unwrap();
        let store = SqliteProductStore::new(pool);
        store
            .create(&Product::new(1, "Product1", Decimal::from(10), 100))
            .await
            .unwrap();
        store
            .create(&Product::new(2, "Product2", Decimal::from(20), 200))
            .await
            .unwrap();
        store
    }

    pub(crate) fn config() -> Config {
        let mut config = Config::default();
        config.jwt = jwt_config();
        config
    }

    pub(crate) async fn app_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            config(),
            Arc::new(seeded_store().await),
            token_issuer(),
        ))
    }

    pub(crate) fn token_for(role: Role) -> String {
        token_issuer()
            .issue_at(&Principal::new("tester", role), chrono::Utc::now())
            .unwrap()
    }
}
