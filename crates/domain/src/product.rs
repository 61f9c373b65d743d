//! Product document and status derivation rules.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Free-form variant descriptor, e.g. `{"color": "red", "size": "M"}`.
///
/// The schema is documented but not enforced; the domain only requires
/// string keys and values.
pub type Variant = BTreeMap<String, String>;

/// Purchasability of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// In catalog and purchasable while inventory lasts.
    #[default]
    Available,

    /// Manually withdrawn (soft delete). Never flipped back
    /// automatically.
    Unavailable,

    /// Inventory was drained to zero by a sale. Restocking flips the
    /// product back to available.
    OutOfStock,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Unavailable => "unavailable",
            ProductStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ProductStatus::Available),
            "unavailable" => Ok(ProductStatus::Unavailable),
            "out_of_stock" => Ok(ProductStatus::OutOfStock),
            other => Err(format!("unknown product status: {other}")),
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub inventory: u32,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// A catalog product.
///
/// The inventory count and the status are only ever mutated through
/// the stock ledger's atomic operations; everything else is plain
/// record data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub description: String,
    pub image: String,
    pub status: ProductStatus,
    pub inventory: u32,
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new available product from admin input.
    pub fn create(input: NewProduct, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "product name must not be empty".to_string(),
            ));
        }
        if input.price.is_negative() {
            return Err(DomainError::InvalidArgument(
                "product price must not be negative".to_string(),
            ));
        }

        Ok(Self {
            id: ProductId::new(),
            name: input.name,
            price: input.price,
            description: input.description,
            image: input.image,
            status: ProductStatus::Available,
            inventory: input.inventory,
            variants: input.variants,
            created_at: now,
            updated_at: now,
        })
    }

    /// Soft-deletes the product. Terminal for the automatic paths:
    /// restocking never resurrects an unavailable product.
    pub fn withdraw(&mut self, now: DateTime<Utc>) {
        self.status = ProductStatus::Unavailable;
        self.updated_at = now;
    }

    /// Returns true iff `quantity` units can be purchased right now.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.status == ProductStatus::Available && self.inventory >= quantity
    }
}
