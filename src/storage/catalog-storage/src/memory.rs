//! In-memory storage backend.
//!
//! Keeps the catalog in an ordered `Vec` behind a `RwLock`. Nothing is
//! persisted; intended for tests and demos.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{sort_by_price_desc, ProductStore};
use crate::error::StorageError;
use crate::product::{seed_products, Product, ProductId};

/// Transient backend holding products in insertion order.
///
/// Each call takes the lock once, so individual operations are atomic, but
/// there is no isolation across calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<Vec<Product>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the demonstration products.
    pub fn seeded() -> Self {
        Self::with_products(seed_products())
    }

    /// Creates a store holding the given products, in order.
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            items: RwLock::new(products),
        }
    }

    /// Returns the number of stored products.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns true if the store holds no products.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Product>, StorageError> {
        let mut snapshot = self.items.read().await.clone();
        sort_by_price_desc(&mut snapshot);
        Ok(snapshot)
    }

    async fn insert(&self, product: Product) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => {
                debug!(product = %product, "Overwriting existing product");
                *existing = product;
            },
            None => items.push(product),
        }
        Ok(())
    }

    async fn get(&self, id: ProductId) -> Result<Product, StorageError> {
        self.items
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StorageError::NotFound { id })
    }

    async fn update(&self, product: Product) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        let existing = items
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(StorageError::NotFound { id: product.id })?;

        existing.name = product.name;
        existing.price = product.price;
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        let index = items
            .iter()
            .position(|p| p.id == id)
            .ok_or(StorageError::NotFound { id })?;

        let removed = items.remove(index);
        debug!(product = %removed, "Product deleted");
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), StorageError> {
        debug!("Cleaning up in-memory store");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
