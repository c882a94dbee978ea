//! Liveness and dependency health reporting.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a single health check
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub description: String,
}

impl HealthCheck {
    pub fn healthy(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            description: description.into(),
        }
    }

    pub fn unhealthy(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    /// Process uptime as `dd.hh:mm:ss`
    pub uptime: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, uptime: Duration) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            checks,
            uptime: format_uptime(uptime),
        }
    }
}

pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{:02}.{:02}:{:02}:{:02}",
        secs / 86_400,
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60
    )
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let mut checks = vec![HealthCheck::healthy(
        "ProductCatalogApp",
        "The application is running.",
    )];

    checks.push(match state.store.ping().await {
        Ok(()) => HealthCheck::healthy("Database", "The database is reachable."),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            HealthCheck::unhealthy("Database", "The database is unreachable.")
        }
    });

    let report = HealthReport::new(checks, state.started_at.elapsed());
    let status = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(report))
}
