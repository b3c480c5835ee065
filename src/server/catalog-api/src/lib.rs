//! # Catalog API
//!
//! REST layer for the catalog service.
//!
//! ## Endpoints
//!
//! - `GET /` - All products, most expensive first
//! - `POST /product` - Create a product (201)
//! - `GET /product/{id}` - Fetch one product
//! - `PUT /product/{id}` - Update name and price; the path id wins over any body id
//! - `DELETE /product/{id}` - Delete a product
//! - `GET /health` - Liveness and active backend

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use catalog_storage::ProductStore;

pub use error::ApiError;
pub use handlers::HealthResponse;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend selected at startup.
    pub store: Arc<dyn ProductStore>,
}

impl AppState {
    /// Wraps a storage backend.
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_products))
        .route("/health", get(handlers::health))
        .route("/product", post(handlers::create_product))
        .route(
            "/product/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
