//! Mock price feed for testing without network calls.

use super::{FeedError, PriceFeed};
use crate::domain::{Chain, PriceObservation, Product, RetailLocation, TimeMs};
use async_trait::async_trait;

/// Mock price feed that returns predefined test data.
#[derive(Debug, Clone, Default)]
pub struct MockPriceFeed {
    observations: Vec<PriceObservation>,
    chains: Vec<Chain>,
    locations: Vec<RetailLocation>,
    products: Vec<Product>,
}

impl MockPriceFeed {
    /// Create a new mock feed with empty data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observation to the mock feed.
    pub fn with_observation(mut self, obs: PriceObservation) -> Self {
        self.observations.push(obs);
        self
    }

    /// Add multiple observations to the mock feed.
    pub fn with_observations(mut self, observations: Vec<PriceObservation>) -> Self {
        self.observations.extend(observations);
        self
    }

    /// Add a chain to the mock feed.
    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chains.push(chain);
        self
    }

    /// Add a location to the mock feed.
    pub fn with_location(mut self, location: RetailLocation) -> Self {
        self.locations.push(location);
        self
    }

    /// Add a product to the mock feed.
    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn fetch_observations(
        &self,
        product: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<PriceObservation>, FeedError> {
        let from = TimeMs::new(from_ms);
        let to = TimeMs::new(to_ms);

        Ok(self
            .observations
            .iter()
            .filter(|o| {
                o.product.as_str() == product && o.created_at >= from && o.created_at <= to
            })
            .cloned()
            .collect())
    }

    async fn fetch_chains(&self) -> Result<Vec<Chain>, FeedError> {
        Ok(self.chains.clone())
    }

    async fn fetch_locations(&self) -> Result<Vec<RetailLocation>, FeedError> {
        Ok(self.locations.clone())
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, FeedError> {
        Ok(self.products.clone())
    }
}
