pub mod catalog;
pub mod deals;
pub mod health;
pub mod observations;
pub mod prices;

use crate::config::Config;
use crate::db::Repository;
use crate::engine::DealEvaluator;
use crate::orchestration::Ingestor;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub ingestor: Arc<Ingestor>,
    pub evaluator: DealEvaluator,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config, ingestor: Arc<Ingestor>) -> Self {
        let evaluator = DealEvaluator::new(config.utc_offset(), config.tie_policy);
        Self {
            repo,
            config,
            ingestor,
            evaluator,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/prices", get(prices::get_prices))
        .route("/v1/deals", get(deals::get_deals))
        .route("/v1/observations", post(observations::submit_observation))
        .route("/v1/chains", get(catalog::get_chains))
        .route("/v1/products", get(catalog::get_products))
        .layer(cors)
        .with_state(state)
}
