use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::ordering::sort_observations_deterministic;
use crate::domain::{LocationId, PriceObservation, ProductId, TimeMs};
use crate::engine::PriceFlags;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesQuery {
    pub product: String,
    pub location: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub valid_only: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesResponse {
    pub prices: Vec<PriceDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDto {
    pub obs_key: String,
    pub product_id: String,
    pub location_id: String,
    pub price: String,
    pub created_at_ms: i64,
    pub is_valid: bool,
    pub is_master_price: bool,
}

impl PriceDto {
    pub(super) fn from_observation(obs: &PriceObservation, flags: PriceFlags) -> Self {
        PriceDto {
            obs_key: obs.obs_key().to_string(),
            product_id: obs.product.as_str().to_string(),
            location_id: obs.location.as_str().to_string(),
            price: obs.price.to_canonical_string(),
            created_at_ms: obs.created_at.as_ms(),
            is_valid: flags.is_valid,
            is_master_price: flags.is_master_price,
        }
    }
}

pub async fn get_prices(
    Query(params): Query<PricesQuery>,
    State(state): State<AppState>,
) -> Result<Json<PricesResponse>, AppError> {
    let product = parse_product_id(&params.product)?;

    let location = params
        .location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| LocationId::new(s.to_string()));

    let from_ms = params.from_ms.map(TimeMs::new);
    let to_ms = params.to_ms.map(TimeMs::new);
    if let (Some(from), Some(to)) = (from_ms, to_ms) {
        if from > to {
            return Err(AppError::BadRequest("fromMs must be <= toMs".to_string()));
        }
    }
    let valid_only = params.valid_only.unwrap_or(false);

    state.ingestor.ensure_catalog().await?;
    state
        .ingestor
        .ensure_observations(&product, from_ms, to_ms)
        .await?;

    // Master prices are determined across every location carrying the
    // product, so the full set is loaded and evaluated before any location
    // filter narrows the response.
    let mut observations = state
        .repo
        .query_observations(&product, None, from_ms, to_ms)
        .await?;
    sort_observations_deterministic(&mut observations);

    let cycles = state.repo.cycle_lookup().await?;
    let now = TimeMs::now();
    let flags = state.evaluator.evaluate_batch(&observations, &cycles, now);

    let prices = observations
        .iter()
        .zip(flags)
        .filter(|(obs, f)| {
            location.as_ref().map(|l| obs.location == *l).unwrap_or(true)
                && (!valid_only || f.is_valid)
        })
        .map(|(obs, f)| PriceDto::from_observation(obs, f))
        .collect();

    Ok(Json(PricesResponse { prices }))
}

pub(super) fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("product is required".to_string()));
    }
    Ok(ProductId::new(trimmed.to_string()))
}
