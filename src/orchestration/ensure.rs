use crate::config::Config;
use crate::datasource::{FeedError, PriceFeed};
use crate::db::Repository;
use crate::domain::{ProductId, TimeMs};
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone)]
pub struct Ingestor {
    feed: Arc<dyn PriceFeed>,
    repo: Arc<Repository>,
    config: Config,
}

impl Ingestor {
    pub fn new(feed: Arc<dyn PriceFeed>, repo: Arc<Repository>, config: Config) -> Self {
        Self { feed, repo, config }
    }

    /// Ensure observations are ingested for the given product/time range.
    ///
    /// Implements window correctness via `LOOKBACK_MS`: the fetch start is
    /// widened so observations submitted before the requested range but
    /// still inside a current deal window are present locally.
    pub async fn ensure_observations(
        &self,
        product: &ProductId,
        from_ms: Option<TimeMs>,
        to_ms: Option<TimeMs>,
    ) -> Result<IngestionResult, IngestionError> {
        let fetch_from = self.compute_fetch_start(from_ms);
        let fetch_to = to_ms.unwrap_or_else(TimeMs::now);

        let observations = self
            .feed
            .fetch_observations(product.as_str(), fetch_from.as_ms(), fetch_to.as_ms())
            .await?;

        let observations_fetched = observations.len();
        let observations_new = self.repo.insert_observations_batch(&observations).await?;

        Ok(IngestionResult {
            observations_fetched,
            observations_new,
            fetch_from,
            fetch_to,
        })
    }

    /// Sync the catalog (chains, locations, products) if none is stored yet.
    pub async fn ensure_catalog(&self) -> Result<(), IngestionError> {
        if self.repo.count_chains().await? > 0 {
            return Ok(());
        }
        self.refresh_catalog().await
    }

    /// Fetch and upsert the full catalog from the feed.
    pub async fn refresh_catalog(&self) -> Result<(), IngestionError> {
        let chains = self.feed.fetch_chains().await?;
        let locations = self.feed.fetch_locations().await?;
        let products = self.feed.fetch_products().await?;

        self.repo.upsert_chains_batch(&chains).await?;
        self.repo.upsert_locations_batch(&locations).await?;
        self.repo.upsert_products_batch(&products).await?;

        tracing::info!(
            chains = chains.len(),
            locations = locations.len(),
            products = products.len(),
            "Catalog synced from feed"
        );
        Ok(())
    }

    fn compute_fetch_start(&self, requested_from: Option<TimeMs>) -> TimeMs {
        let requested = requested_from.unwrap_or(TimeMs::new(0));
        let lookback = self.config.lookback_ms;
        let fetch_from = TimeMs::new(requested.as_ms().saturating_sub(lookback));

        tracing::info!(
            "Window correctness: requested from {} but fetching from {} (lookback {}ms)",
            requested.as_ms(),
            fetch_from.as_ms(),
            lookback
        );

        fetch_from
    }
}

#[derive(Debug)]
pub struct IngestionResult {
    pub observations_fetched: usize,
    pub observations_new: usize,
    pub fetch_from: TimeMs,
    pub fetch_to: TimeMs,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
