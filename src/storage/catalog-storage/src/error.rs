//! Storage error types.

use thiserror::Error;

use crate::product::ProductId;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No product with the given id exists.
    #[error("Product <{id}> does not exist")]
    NotFound {
        /// The id that was looked up.
        id: ProductId,
    },

    /// Connection to the underlying store failed.
    #[error("connection error: {0}")]
    ConnectionFailed(String),

    /// A read or write against the store failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A stored item could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid backend configuration or input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    /// Returns true if this is a [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// A product rejected before reaching storage.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Id is negative and could never be addressed by a `[0-9]+` route.
    #[error("invalid product id: {0}")]
    NegativeId(ProductId),

    /// Product name is empty or whitespace.
    #[error("product name cannot be empty")]
    EmptyName,

    /// Price is negative, NaN or infinite.
    #[error("invalid price: {0}")]
    InvalidPrice(f64),
}
