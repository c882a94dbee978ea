use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use super::extract::ApiJson;
use super::validation::validate_product;
use super::API_PREFIX;
use crate::auth::Claims;
use crate::db::Product;
use crate::AppState;

fn actor(claims: &Option<Extension<Claims>>) -> &str {
    claims
        .as_ref()
        .map(|Extension(c)| c.sub.as_str())
        .unwrap_or("anonymous")
}

/// List all products
///
/// GET /api/v1/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .store
        .list_all()
        .await
        .map_err(|e| ApiError::from_store(e, "An error occurred while retrieving products."))?;

    Ok(Json(products))
}

/// Get a single product
///
/// GET /api/v1/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .store
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_store(e, "An error occurred while retrieving the product."))?;

    Ok(Json(product))
}

/// Create a product
///
/// POST /api/v1/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    claims: Option<Extension<Claims>>,
    ApiJson(product): ApiJson<Product>,
) -> Result<impl IntoResponse, ApiError> {
    validate_product(&product)?;

    let created = state
        .store
        .create(&product)
        .await
        .map_err(|e| ApiError::from_store(e, "An error occurred while creating the product."))?;

    info!(id = created.id, name = %created.name, user = %actor(&claims), "Product created");

    let location = format!("{}/products/{}", API_PREFIX, created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

/// Replace the mutable fields of a product
///
/// PUT /api/v1/products/:id
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<i64>,
    ApiJson(product): ApiJson<Product>,
) -> Result<StatusCode, ApiError> {
    if id != product.id {
        return Err(ApiError::bad_request("Product ID mismatch."));
    }
    validate_product(&product)?;

    state
        .store
        .update(id, &product)
        .await
        .map_err(|e| ApiError::from_store(e, "An error occurred while updating the product."))?;

    info!(id, user = %actor(&claims), "Product updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a product
///
/// DELETE /api/v1/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete(id)
        .await
        .map_err(|e| ApiError::from_store(e, "An error occurred while deleting the product."))?;

    info!(id, user = %actor(&claims), "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
