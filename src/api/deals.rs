use axum::extract::{Query, State};
use axum::Json;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::ordering::sort_observations_deterministic;
use crate::domain::{PriceObservation, ProductId, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealsQuery {
    /// Comma-separated product ids; defaults to the configured watch list.
    pub products: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealsResponse {
    pub deals: Vec<DealDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDto {
    pub product_id: String,
    pub best_price: String,
    pub locations: Vec<DealLocationDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealLocationDto {
    pub location_id: String,
    pub price: String,
    pub created_at_ms: i64,
}

pub async fn get_deals(
    Query(params): Query<DealsQuery>,
    State(state): State<AppState>,
) -> Result<Json<DealsResponse>, AppError> {
    let products = resolve_products(params.products.as_deref(), &state.config.watched_products);
    if products.is_empty() {
        return Ok(Json(DealsResponse { deals: Vec::new() }));
    }

    state.ingestor.ensure_catalog().await?;
    let cycles = state.repo.cycle_lookup().await?;
    let now = TimeMs::now();

    // Ingest and load every product concurrently; the digest itself runs
    // against the one captured `now`.
    let product_futures = products.into_iter().map(|product| {
        let state = state.clone();
        async move {
            state
                .ingestor
                .ensure_observations(&product, None, Some(now))
                .await?;
            let mut observations = state
                .repo
                .query_observations(&product, None, None, None)
                .await?;
            sort_observations_deterministic(&mut observations);
            Ok::<(ProductId, Vec<PriceObservation>), AppError>((product, observations))
        }
    });
    let per_product = try_join_all(product_futures).await?;

    let digest = state.evaluator.build_digest(per_product, &cycles, now);

    let deals = digest
        .into_iter()
        .map(|entry| DealDto {
            product_id: entry.product.as_str().to_string(),
            best_price: entry.best_price.to_canonical_string(),
            locations: entry
                .observations
                .iter()
                .map(|obs| DealLocationDto {
                    location_id: obs.location.as_str().to_string(),
                    price: obs.price.to_canonical_string(),
                    created_at_ms: obs.created_at.as_ms(),
                })
                .collect(),
        })
        .collect();

    Ok(Json(DealsResponse { deals }))
}

fn resolve_products(requested: Option<&str>, watched: &[String]) -> Vec<ProductId> {
    let raw: Vec<String> = match requested {
        Some(csv) => csv
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => watched.to_vec(),
    };

    let mut products = Vec::new();
    for id in raw {
        let product = ProductId::new(id);
        if !products.contains(&product) {
            products.push(product);
        }
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_products_prefers_query() {
        let watched = vec!["milk".to_string()];
        let products = resolve_products(Some("bread, eggs"), &watched);
        assert_eq!(
            products,
            vec![
                ProductId::new("bread".to_string()),
                ProductId::new("eggs".to_string())
            ]
        );
    }

    #[test]
    fn test_resolve_products_falls_back_to_watch_list() {
        let watched = vec!["milk".to_string(), "bread".to_string()];
        let products = resolve_products(None, &watched);
        assert_eq!(products.len(), 2);
    }

    #[test]
    fn test_resolve_products_dedupes() {
        let products = resolve_products(Some("milk,milk, milk"), &[]);
        assert_eq!(products, vec![ProductId::new("milk".to_string())]);
    }
}
