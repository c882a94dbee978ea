pub mod auth;
pub mod error;
mod extract;
pub mod health;
mod policy;
mod products;
mod validation;

pub use policy::{bearer_token, AuthorizationPolicies, CatalogOperation, Policy};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Versioned prefix of every catalog endpoint
pub const API_PREFIX: &str = "/api/v1";

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new().route("/login", post(auth::login));

    // Product routes, authorized per operation
    let product_routes = Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            policy::authorize,
        ));

    Router::new()
        .route("/health", get(health::health))
        .nest(&format!("{}/auth", API_PREFIX), auth_routes)
        .nest(&format!("{}/products", API_PREFIX), product_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
