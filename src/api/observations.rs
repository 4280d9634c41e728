use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::prices::{parse_product_id, PriceDto};
use super::AppState;
use crate::domain::ordering::sort_observations_deterministic;
use crate::domain::{LocationId, Price, PriceObservation, TimeMs};
use crate::engine::PriceFlags;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitObservationRequest {
    pub product_id: String,
    pub location_id: String,
    /// Decimal string, parsed losslessly.
    pub price: String,
    /// Defaults to submission time.
    pub created_at_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitObservationResponse {
    pub observation: PriceDto,
    /// False when an identical observation already existed.
    pub inserted: bool,
}

pub async fn submit_observation(
    State(state): State<AppState>,
    Json(req): Json<SubmitObservationRequest>,
) -> Result<(StatusCode, Json<SubmitObservationResponse>), AppError> {
    let product = parse_product_id(&req.product_id)?;

    let location_raw = req.location_id.trim();
    if location_raw.is_empty() {
        return Err(AppError::BadRequest("locationId is required".to_string()));
    }
    let location = LocationId::new(location_raw.to_string());

    let price = Price::from_str_canonical(req.price.trim())
        .map_err(|_| AppError::BadRequest("Invalid price".to_string()))?;
    if !price.is_positive() {
        return Err(AppError::BadRequest("price must be positive".to_string()));
    }

    state.ingestor.ensure_catalog().await?;
    if state.repo.get_location(&location).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "unknown location {}",
            location
        )));
    }

    let now = TimeMs::now();
    let created_at = req.created_at_ms.map(TimeMs::new).unwrap_or(now);
    let source_id = uuid::Uuid::new_v4().to_string();

    let observation = PriceObservation::new(
        product.clone(),
        location,
        price,
        created_at,
        Some(source_id),
    );
    let inserted = state.repo.insert_observation(&observation).await?;

    // Evaluate the new observation against the product's full set so the
    // client can render its badges immediately.
    let mut all = state
        .repo
        .query_observations(&product, None, None, None)
        .await?;
    sort_observations_deterministic(&mut all);
    let cycles = state.repo.cycle_lookup().await?;
    let flags = state
        .evaluator
        .evaluate_batch(&all, &cycles, now)
        .into_iter()
        .zip(&all)
        .find(|(_, o)| o.obs_key() == observation.obs_key())
        .map(|(f, _)| f)
        .unwrap_or(PriceFlags::default());

    Ok((
        StatusCode::CREATED,
        Json(SubmitObservationResponse {
            observation: PriceDto::from_observation(&observation, flags),
            inserted,
        }),
    ))
}
