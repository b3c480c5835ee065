//! Storage backend trait definition.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::product::{Product, ProductId};

/// Storage contract for the product catalog.
///
/// Backends are selected once at startup and shared as
/// `Arc<dyn ProductStore>`. The contract adds no locking or transactions of
/// its own; each backend inherits whatever atomicity its primitive offers.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns every product, ordered by price descending.
    ///
    /// Always reads the current state; ties are in no particular order.
    async fn list(&self) -> Result<Vec<Product>, StorageError>;

    /// Adds a product. An existing product with the same id is overwritten.
    async fn insert(&self, product: Product) -> Result<(), StorageError>;

    /// Looks up a product by id.
    async fn get(&self, id: ProductId) -> Result<Product, StorageError>;

    /// Replaces the name and price of the product with `product.id`.
    ///
    /// Behavior on a missing id is backend specific: the SQLite backend
    /// creates the product, the in-memory backend returns
    /// [`StorageError::NotFound`].
    async fn update(&self, product: Product) -> Result<(), StorageError>;

    /// Removes the product with the given id.
    async fn delete(&self, id: ProductId) -> Result<(), StorageError>;

    /// Releases backend resources. Never destroys stored data.
    async fn cleanup(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Returns the name of this backend for logging.
    fn name(&self) -> &'static str;
}

/// Sorts products by price, most expensive first.
pub fn sort_by_price_desc(products: &mut [Product]) {
    products.sort_by(|a, b| b.price.total_cmp(&a.price));
}
