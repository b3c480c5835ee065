//! Request handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use catalog_storage::{Product, ProductId};

use crate::error::ApiError;
use crate::AppState;

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is answering.
    pub status: &'static str,
    /// Active storage backend.
    pub backend: &'static str,
    /// Server version.
    pub version: &'static str,
}

/// Parses a `[0-9]+` path segment.
///
/// Anything else did not match the route; digits that overflow are a bad
/// request.
fn parse_id(raw: &str) -> Result<ProductId, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::RouteNotFound(format!("/product/{raw}")));
    }

    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid product id {raw}: {e}")))
}

/// Decodes a product from the raw body, whatever the declared content type.
fn decode_body(body: &[u8]) -> Result<Product, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid product body: {e}")))
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.store.name(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list().await?;
    Ok(Json(products))
}

pub(crate) async fn create_product(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = decode_body(&body)?;
    product.validate()?;

    state.store.insert(product.clone()).await?;
    info!(product = %product, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    let product = state.store.get(id).await?;
    Ok(Json(product))
}

pub(crate) async fn update_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    let mut product = decode_body(&body)?;
    product.id = id;
    product.validate()?;

    state.store.update(product.clone()).await?;
    info!(product = %product, "Product updated");

    Ok(Json(product))
}

pub(crate) async fn delete_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&raw_id)?;

    state.store.delete(id).await?;
    info!(id, "Product deleted");

    Ok(Json(serde_json::json!({ "result": "success" })))
}
