//! Reference data: chains, retail locations, products.

use crate::domain::{ChainId, DealCycle, LocationId, ProductId};
use serde::{Deserialize, Serialize};

/// A retail chain. Carries the chain-wide deal cycle, if one is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: ChainId,
    pub name: String,
    /// None when the chain has no (or a malformed) cycle configuration.
    /// Observations at such chains are never valid for a current cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<DealCycle>,
}

impl Chain {
    /// Create a Chain.
    pub fn new(chain_id: ChainId, name: String, cycle: Option<DealCycle>) -> Self {
        Chain {
            chain_id,
            name,
            cycle,
        }
    }
}

/// A physical retail location belonging to a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailLocation {
    pub location_id: LocationId,
    pub chain_id: ChainId,
    pub name: String,
}

impl RetailLocation {
    /// Create a RetailLocation.
    pub fn new(location_id: LocationId, chain_id: ChainId, name: String) -> Self {
        RetailLocation {
            location_id,
            chain_id,
            name,
        }
    }
}

/// A product users compare prices for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
}

impl Product {
    /// Create a Product.
    pub fn new(product_id: ProductId, name: String) -> Self {
        Product { product_id, name }
    }
}
