//! Process composition
//!
//! Wires configuration into the two servers:
//! - API: pool -> store -> credentials -> token issuer -> state -> router
//! - Web: API client -> session store -> state -> router

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{StaticCredentials, TokenIssuer};
use crate::client::CatalogClient;
use crate::config::Config;
use crate::session::{self, MemorySessionStore, SessionStore};
use crate::store::SqliteProductStore;
use crate::{api, db, web, AppState, WebState};

/// Build the catalog API router over the configured database
pub async fn build_api(config: &Config) -> Result<Router> {
    let db = db::init(&config.database).await?;
    let store = Arc::new(SqliteProductStore::new(db));

    if config.auth.uses_default_password() {
        warn!("Using the default admin password; set CATALOG_ADMIN_PASSWORD");
    }
    let credentials = Arc::new(StaticCredentials::from_config(&config.auth));
    let tokens = TokenIssuer::new(&config.jwt, credentials);

    let state = Arc::new(AppState::new(config.clone(), store, tokens));
    Ok(api::create_router(state))
}

/// Build the web front-end router and start its session cleanup task
pub fn build_web(config: &Config) -> Result<Router> {
    let client =
        CatalogClient::new(&config.web).context("Failed to build catalog API client")?;

    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    session::spawn_cleanup_task(sessions.clone(), config.web.session_cleanup_interval_secs);

    info!(api = %client.base_url(), "Web front-end using catalog API");
    let state = Arc::new(WebState::new(config.clone(), client, sessions));
    Ok(web::create_router(state))
}

/// Bind `addr` and serve until a shutdown signal arrives
pub async fn serve(name: &str, addr: &str, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {} server to {}", name, addr))?;

    info!("{} server listening on http://{}", name, addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| format!("{} server error", name))?;

    info!("{} server stopped", name);
    Ok(())
}

pub async fn run_api(config: &Config) -> Result<()> {
    let router = build_api(config).await?;
    serve("API", &config.api_addr(), router).await
}

pub async fn run_web(config: &Config) -> Result<()> {
    let router = build_web(config)?;
    serve("Web", &config.web_addr(), router).await
}

pub async fn run_all(config: &Config) -> Result<()> {
    let api = build_api(config).await?;
    let web = build_web(config)?;
    let api_addr = config.api_addr();
    let web_addr = config.web_addr();

    tokio::try_join!(
        serve("API", &api_addr, api),
        serve("Web", &web_addr, web),
    )?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        config
    }

    #[tokio::test]
    async fn test_build_api_serves_seeded_catalog() {
        let router = build_api(&memory_config()).await.unwrap();

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::get("/api/v1/products/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_build_web_redirects_root() {
        let router = build_web(&memory_config()).unwrap();

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_redirection());
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let err = serve("API", &addr, Router::new()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind API server"));
    }

    #[tokio::test]
    async fn test_run_all_stops_when_api_port_is_taken() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = memory_config();
        config.server.host = "127.0.0.1".to_string();
        config.server.api_port = listener.local_addr().unwrap().port();
        config.server.web_port = 0;

        let err = run_all(&config).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind API server"));
    }
}
