use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDto {
    pub chain_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_start_day: Option<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub product_id: String,
    pub name: String,
}

pub async fn get_chains(State(state): State<AppState>) -> Result<Json<Vec<ChainDto>>, AppError> {
    state.ingestor.ensure_catalog().await?;

    let chains = state
        .repo
        .query_chains()
        .await?
        .into_iter()
        .map(|chain| ChainDto {
            chain_id: chain.chain_id.as_str().to_string(),
            name: chain.name,
            cycle_start_day: chain.cycle.map(|c| c.start_day.as_u8()),
        })
        .collect();

    Ok(Json(chains))
}

pub async fn get_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductDto>>, AppError> {
    state.ingestor.ensure_catalog().await?;

    let products = state
        .repo
        .query_products()
        .await?
        .into_iter()
        .map(|product| ProductDto {
            product_id: product.product_id.as_str().to_string(),
            name: product.name,
        })
        .collect();

    Ok(Json(products))
}
