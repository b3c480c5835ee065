//! # Catalog Storage
//!
//! Product model and storage abstraction layer for the catalog service.
//!
//! Provides the [`ProductStore`] contract every backend implements, the
//! [`Product`] value type, and the in-process [`MemoryStore`] backend.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod product;

pub use backend::{sort_by_price_desc, ProductStore};
pub use error::{StorageError, ValidationError};
pub use memory::MemoryStore;
pub use product::{seed_products, Attributes, Product, ProductId};
