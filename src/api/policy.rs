//! Per-operation authorization.
//!
//! Each catalog operation is bound to a [`Policy`]. The [`authorize`]
//! middleware resolves the operation of the incoming request, looks up its
//! policy and rejects the request before the handler (and the store) runs.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderMap, Method, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::{AuthError, Role};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOperation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl CatalogOperation {
    /// `targets_item` is true for `/products/:id` routes.
    pub fn resolve(method: &Method, targets_item: bool) -> Option<Self> {
        match (method, targets_item) {
            (&Method::GET, false) => Some(CatalogOperation::List),
            (&Method::GET, true) => Some(CatalogOperation::Get),
            (&Method::POST, false) => Some(CatalogOperation::Create),
            (&Method::PUT, true) => Some(CatalogOperation::Update),
            (&Method::DELETE, true) => Some(CatalogOperation::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Public,
    RequireRole(Role),
}

#[derive(Debug, Clone)]
pub struct AuthorizationPolicies {
    rules: HashMap<CatalogOperation, Policy>,
}

impl Default for AuthorizationPolicies {
    /// Public reads, Admin-only mutations
    fn default() -> Self {
        Self::empty()
            .bind(CatalogOperation::List, Policy::Public)
            .bind(CatalogOperation::Get, Policy::Public)
            .bind(CatalogOperation::Create, Policy::RequireRole(Role::Admin))
            .bind(CatalogOperation::Update, Policy::RequireRole(Role::Admin))
            .bind(CatalogOperation::Delete, Policy::RequireRole(Role::Admin))
    }
}

impl AuthorizationPolicies {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn bind(mut self, operation: CatalogOperation, policy: Policy) -> Self {
        self.rules.insert(operation, policy);
        self
    }

    /// Unbound operations require Admin.
    pub fn policy_for(&self, operation: CatalogOperation) -> Policy {
        self.rules
            .get(&operation)
            .copied()
            .unwrap_or(Policy::RequireRole(Role::Admin))
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("Authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authorization middleware, installed as a route layer on product routes
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let targets_item = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().ends_with("/:id"))
        .unwrap_or(false);

    let Some(operation) = CatalogOperation::resolve(request.method(), targets_item) else {
        return Ok(next.run(request).await);
    };

    let required = match state.policies.policy_for(operation) {
        Policy::Public => return Ok(next.run(request).await),
        Policy::RequireRole(role) => role,
    };

    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let claims = state.tokens.validate(token).map_err(|e| {
        tracing::debug!(?operation, error = %e, "Rejected bearer token");
        match e {
            AuthError::Expired => ApiError::unauthorized("Token expired"),
            _ => ApiError::unauthorized("Invalid token"),
        }
    })?;

    if claims.role != required {
        tracing::warn!(
            ?operation,
            user = %claims.sub,
            role = %claims.role,
            required = %required,
            "Insufficient role"
        );
        return Err(ApiError::forbidden(format!(
            "The {} role is required for this operation",
            required
        )));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
