//! Product entity and its storage-boundary codec.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageError, ValidationError};

/// Product identity. Externally assigned, immutable once created.
pub type ProductId = i64;

/// Generic attribute mapping used at the storage boundary.
pub type Attributes = serde_json::Map<String, Value>;

/// A catalog entry.
///
/// Request bodies may omit `id` (it defaults to `0`) and may use the
/// capitalised `Name` / `Price` keys accepted by older clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Partition key.
    #[serde(default)]
    pub id: ProductId,
    /// Display name.
    #[serde(alias = "Name")]
    pub name: String,
    /// Unit price, never negative.
    #[serde(alias = "Price")]
    pub price: f64,
}

impl Product {
    /// Creates a new product.
    pub fn new(id: ProductId, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }

    /// Checks the fields a client is allowed to set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id < 0 {
            return Err(ValidationError::NegativeId(self.id));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::InvalidPrice(self.price));
        }
        Ok(())
    }

    /// Encodes the product as an attribute mapping.
    pub fn to_attributes(&self) -> Result<Attributes, StorageError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(attrs)) => Ok(attrs),
            Ok(other) => Err(StorageError::Serialization(format!(
                "expected an attribute map, got {other}"
            ))),
            Err(e) => Err(StorageError::Serialization(e.to_string())),
        }
    }

    /// Decodes a product from an attribute mapping.
    ///
    /// Unlike request bodies, stored items must carry their `id`.
    pub fn from_attributes(attrs: Attributes) -> Result<Self, StorageError> {
        if !attrs.contains_key("id") {
            return Err(StorageError::Serialization("missing attribute: id".into()));
        }
        serde_json::from_value(Value::Object(attrs))
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<(Id: {}) {{{}}} @ {}>", self.id, self.name, self.price)
    }
}

/// The demonstration data every backend starts with.
pub fn seed_products() -> Vec<Product> {
    vec![
        Product::new(1, "Apple", 0.98),
        Product::new(2, "Orange", 0.98),
        Product::new(3, "Bananas", 2.25),
        Product::new(4, "Frozen Pizza", 4.99),
    ]
}
