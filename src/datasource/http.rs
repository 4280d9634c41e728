//! HTTP price feed client for the hosted backend's export API.

use super::{FeedError, PriceFeed};
use crate::domain::{
    Chain, ChainId, DealCycle, LocationId, Price, PriceObservation, Product, ProductId,
    RetailLocation, StartDay, TimeMs,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Price feed over the hosted backend's JSON export endpoints.
#[derive(Debug, Clone)]
pub struct HttpPriceFeed {
    client: Client,
    base_url: String,
}

impl HttpPriceFeed {
    /// Create a new feed client against the given base URL.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, FeedError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(FeedError::NetworkError(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(FeedError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(FeedError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(FeedError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(FeedError::ParseError(e.to_string())))
        })
        .await
    }

    fn expect_array(value: serde_json::Value) -> Result<Vec<serde_json::Value>, FeedError> {
        match value {
            serde_json::Value::Array(items) => Ok(items),
            _ => Err(FeedError::ParseError("Expected array response".to_string())),
        }
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    async fn fetch_observations(
        &self,
        product: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<PriceObservation>, FeedError> {
        debug!(
            "Fetching observations for product={}, from_ms={}, to_ms={}",
            product, from_ms, to_ms
        );

        let response = self
            .get_json(
                "/v1/export/observations",
                &[
                    ("product", product.to_string()),
                    ("fromMs", from_ms.to_string()),
                    ("toMs", to_ms.to_string()),
                ],
            )
            .await?;

        let mut observations = Vec::new();
        for item in Self::expect_array(response)? {
            match parse_observation(&item) {
                Ok(obs) => observations.push(obs),
                Err(e) => {
                    warn!("Failed to parse observation: {}", e);
                }
            }
        }

        Ok(observations)
    }

    async fn fetch_chains(&self) -> Result<Vec<Chain>, FeedError> {
        debug!("Fetching chains");
        let response = self.get_json("/v1/export/chains", &[]).await?;

        let mut chains = Vec::new();
        for item in Self::expect_array(response)? {
            match parse_chain(&item) {
                Ok(chain) => chains.push(chain),
                Err(e) => {
                    warn!("Failed to parse chain: {}", e);
                }
            }
        }

        Ok(chains)
    }

    async fn fetch_locations(&self) -> Result<Vec<RetailLocation>, FeedError> {
        debug!("Fetching locations");
        let response = self.get_json("/v1/export/locations", &[]).await?;

        let mut locations = Vec::new();
        for item in Self::expect_array(response)? {
            match parse_location(&item) {
                Ok(location) => locations.push(location),
                Err(e) => {
                    warn!("Failed to parse location: {}", e);
                }
            }
        }

        Ok(locations)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, FeedError> {
        debug!("Fetching products");
        let response = self.get_json("/v1/export/products", &[]).await?;

        let mut products = Vec::new();
        for item in Self::expect_array(response)? {
            match parse_product(&item) {
                Ok(product) => products.push(product),
                Err(e) => {
                    warn!("Failed to parse product: {}", e);
                }
            }
        }

        Ok(products)
    }
}

fn get_str(value: &serde_json::Value, field: &str) -> Result<String, FeedError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| FeedError::ParseError(format!("missing or non-string field {}", field)))
}

fn parse_price(value: &serde_json::Value) -> Result<Price, FeedError> {
    // The export serializes prices as JSON numbers; older records carry
    // strings. Accept both, losslessly.
    let raw = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Err(FeedError::ParseError("price is not a number".to_string())),
    };
    Price::from_str_canonical(&raw)
        .map_err(|e| FeedError::ParseError(format!("invalid price {}: {}", raw, e)))
}

fn parse_observation(item: &serde_json::Value) -> Result<PriceObservation, FeedError> {
    let source_id = get_str(item, "id")?;
    let product = ProductId::new(get_str(item, "productId")?);
    let location = LocationId::new(get_str(item, "locationId")?);
    let price = parse_price(
        item.get("price")
            .ok_or_else(|| FeedError::ParseError("missing field price".to_string()))?,
    )?;
    let created_at = item
        .get("createdAtMs")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| FeedError::ParseError("missing or non-integer createdAtMs".to_string()))?;

    Ok(PriceObservation::new(
        product,
        location,
        price,
        TimeMs::new(created_at),
        Some(source_id),
    ))
}

fn parse_chain(item: &serde_json::Value) -> Result<Chain, FeedError> {
    let chain_id = ChainId::new(get_str(item, "id")?);
    let name = get_str(item, "name")?;

    // A missing, null, or out-of-range start day is a chain without a
    // cycle, not a parse failure.
    let cycle = item
        .get("cycleStartDay")
        .and_then(|v| v.as_i64())
        .and_then(StartDay::from_i64)
        .map(DealCycle::new);

    Ok(Chain::new(chain_id, name, cycle))
}

fn parse_location(item: &serde_json::Value) -> Result<RetailLocation, FeedError> {
    Ok(RetailLocation::new(
        LocationId::new(get_str(item, "id")?),
        ChainId::new(get_str(item, "chainId")?),
        get_str(item, "name")?,
    ))
}

fn parse_product(item: &serde_json::Value) -> Result<Product, FeedError> {
    Ok(Product::new(
        ProductId::new(get_str(item, "id")?),
        get_str(item, "name")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_observation() {
        let item = json!({
            "id": "doc-1",
            "productId": "milk",
            "locationId": "l1",
            "price": 1.89,
            "createdAtMs": 1000
        });

        let obs = parse_observation(&item).expect("parse failed");
        assert_eq!(obs.obs_key(), "src:doc-1");
        assert_eq!(obs.product.as_str(), "milk");
        assert_eq!(obs.price, Price::from_str_canonical("1.89").unwrap());
        assert_eq!(obs.created_at, TimeMs::new(1000));
    }

    #[test]
    fn test_parse_observation_string_price() {
        let item = json!({
            "id": "doc-2",
            "productId": "milk",
            "locationId": "l1",
            "price": "2.99",
            "createdAtMs": 1000
        });

        let obs = parse_observation(&item).expect("parse failed");
        assert_eq!(obs.price, Price::from_str_canonical("2.99").unwrap());
    }

    #[test]
    fn test_parse_observation_missing_field() {
        let item = json!({
            "id": "doc-3",
            "productId": "milk",
            "price": 1.89,
            "createdAtMs": 1000
        });

        assert!(parse_observation(&item).is_err());
    }

    #[test]
    fn test_parse_chain_with_and_without_cycle() {
        let configured = json!({"id": "c1", "name": "Corner Mart", "cycleStartDay": 4});
        let chain = parse_chain(&configured).unwrap();
        assert_eq!(chain.cycle.unwrap().start_day.as_u8(), 4);

        let unconfigured = json!({"id": "c2", "name": "No Deals Inc", "cycleStartDay": null});
        assert!(parse_chain(&unconfigured).unwrap().cycle.is_none());

        let out_of_range = json!({"id": "c3", "name": "Nine", "cycleStartDay": 9});
        assert!(parse_chain(&out_of_range).unwrap().cycle.is_none());
    }

    #[test]
    fn test_parse_location_and_product() {
        let loc = json!({"id": "l1", "chainId": "c1", "name": "Downtown"});
        let parsed = parse_location(&loc).unwrap();
        assert_eq!(parsed.chain_id.as_str(), "c1");

        let prod = json!({"id": "milk", "name": "Whole Milk 1L"});
        assert_eq!(parse_product(&prod).unwrap().name, "Whole Milk 1L");
    }
}
