//! Price feed abstraction for pulling observations and reference data from
//! the hosted backend's export API.

use crate::domain::{Chain, PriceObservation, Product, RetailLocation};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpPriceFeed;
pub use mock::MockPriceFeed;

/// Feed trait for fetching price observations and catalog reference data.
///
/// Implementations must handle retry/backoff and rate limiting.
#[async_trait]
pub trait PriceFeed: Send + Sync + fmt::Debug {
    /// Fetch price observations for a product within a time range.
    ///
    /// # Arguments
    /// * `product` - Product id
    /// * `from_ms` - Start time in milliseconds (inclusive)
    /// * `to_ms` - End time in milliseconds (inclusive)
    ///
    /// # Returns
    /// Vector of observations; callers re-sort deterministically.
    async fn fetch_observations(
        &self,
        product: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<PriceObservation>, FeedError>;

    /// Fetch all chains with their deal-cycle configuration.
    async fn fetch_chains(&self) -> Result<Vec<Chain>, FeedError>;

    /// Fetch all retail locations.
    async fn fetch_locations(&self) -> Result<Vec<RetailLocation>, FeedError>;

    /// Fetch the product catalog.
    async fn fetch_products(&self) -> Result<Vec<Product>, FeedError>;
}

/// Error type for feed operations.
#[derive(Debug, Clone)]
pub enum FeedError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            FeedError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            FeedError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FeedError::RateLimited => write!(f, "Rate limited"),
            FeedError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_display() {
        let err = FeedError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = FeedError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = FeedError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        let err = FeedError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");
    }
}
