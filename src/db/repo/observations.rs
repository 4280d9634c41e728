//! Price observation operations.

use super::Repository;
use crate::domain::{LocationId, Price, PriceObservation, ProductId, TimeMs};
use sqlx::Row;
use tracing::warn;

impl Repository {
    /// Insert an observation idempotently.
    ///
    /// Returns true if the row was newly inserted, false if the key already
    /// existed.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_observation(&self, obs: &PriceObservation) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO observations (obs_key, product_id, location_id, price, created_at_ms, source_id)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(obs_key) DO NOTHING
            "#,
        )
        .bind(obs.obs_key())
        .bind(obs.product.as_str())
        .bind(obs.location.as_str())
        .bind(obs.price.to_canonical_string())
        .bind(obs.created_at.as_ms())
        .bind(obs.source_id.as_deref())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert multiple observations in a single transaction.
    ///
    /// Returns the number of newly inserted observations (excludes duplicates).
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_observations_batch(
        &self,
        observations: &[PriceObservation],
    ) -> Result<usize, sqlx::Error> {
        if observations.is_empty() {
            return Ok(0);
        }

        let mut total_inserted = 0usize;
        let mut tx = self.pool().begin().await?;

        for obs in observations {
            let result = sqlx::query(
                r#"
                INSERT INTO observations (obs_key, product_id, location_id, price, created_at_ms, source_id)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(obs_key) DO NOTHING
                "#,
            )
            .bind(obs.obs_key())
            .bind(obs.product.as_str())
            .bind(obs.location.as_str())
            .bind(obs.price.to_canonical_string())
            .bind(obs.created_at.as_ms())
            .bind(obs.source_id.as_deref())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                total_inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(total_inserted)
    }

    /// Query observations for a product, optionally restricted to a location
    /// and/or a time range.
    ///
    /// Rows with an unparseable price column are skipped with a warning; a
    /// single bad record never aborts the batch.
    pub async fn query_observations(
        &self,
        product: &ProductId,
        location: Option<&LocationId>,
        from_ms: Option<TimeMs>,
        to_ms: Option<TimeMs>,
    ) -> Result<Vec<PriceObservation>, sqlx::Error> {
        let from = from_ms.map(|t| t.as_ms()).unwrap_or(i64::MIN);
        let to = to_ms.map(|t| t.as_ms()).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT obs_key, product_id, location_id, price, created_at_ms, source_id
            FROM observations
            WHERE product_id = ?
              AND (? IS NULL OR location_id = ?)
              AND created_at_ms >= ? AND created_at_ms <= ?
            ORDER BY created_at_ms ASC, obs_key ASC
            "#,
        )
        .bind(product.as_str())
        .bind(location.map(|l| l.as_str()))
        .bind(location.map(|l| l.as_str()))
        .bind(from)
        .bind(to)
        .fetch_all(self.pool())
        .await?;

        let mut observations = Vec::with_capacity(rows.len());
        for row in rows {
            let obs_key: String = row.get("obs_key");
            let price_str: String = row.get("price");

            let price = match Price::from_str_canonical(&price_str) {
                Ok(p) => p,
                Err(e) => {
                    warn!(
                        obs_key = %obs_key,
                        price = %price_str,
                        error = %e,
                        "Skipping observation with unparseable price"
                    );
                    continue;
                }
            };

            observations.push(PriceObservation {
                obs_key,
                product: ProductId::new(row.get("product_id")),
                location: LocationId::new(row.get("location_id")),
                price,
                created_at: TimeMs::new(row.get("created_at_ms")),
                source_id: row.get("source_id"),
            });
        }

        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn obs(product: &str, location: &str, price: &str, created_at: i64) -> PriceObservation {
        PriceObservation::new(
            ProductId::new(product.to_string()),
            LocationId::new(location.to_string()),
            Price::from_str_canonical(price).unwrap(),
            TimeMs::new(created_at),
            Some(format!("{}-{}-{}", product, location, created_at)),
        )
    }

    #[tokio::test]
    async fn test_insert_and_query_by_product() {
        let (repo, _temp) = setup_test_db().await;

        let milk = obs("milk", "l1", "1.89", 1000);
        let bread = obs("bread", "l1", "3.50", 2000);
        repo.insert_observations_batch(&[milk.clone(), bread])
            .await
            .unwrap();

        let results = repo
            .query_observations(&ProductId::new("milk".to_string()), None, None, None)
            .await
            .unwrap();
        assert_eq!(results, vec![milk]);
    }

    #[tokio::test]
    async fn test_insert_duplicate_ignored() {
        let (repo, _temp) = setup_test_db().await;

        let o = obs("milk", "l1", "1.89", 1000);
        let inserted1 = repo.insert_observation(&o).await.unwrap();
        let inserted2 = repo.insert_observation(&o).await.unwrap();

        assert!(inserted1);
        assert!(!inserted2);
    }

    #[tokio::test]
    async fn test_query_time_range_and_location_filters() {
        let (repo, _temp) = setup_test_db().await;

        let early = obs("milk", "l1", "1.89", 1000);
        let late = obs("milk", "l2", "1.79", 5000);
        repo.insert_observations_batch(&[early.clone(), late.clone()])
            .await
            .unwrap();

        let product = ProductId::new("milk".to_string());

        let ranged = repo
            .query_observations(&product, None, Some(TimeMs::new(2000)), None)
            .await
            .unwrap();
        assert_eq!(ranged, vec![late.clone()]);

        let located = repo
            .query_observations(
                &product,
                Some(&LocationId::new("l1".to_string())),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(located, vec![early]);
    }

    #[tokio::test]
    async fn test_unparseable_price_row_skipped() {
        let (repo, _temp) = setup_test_db().await;

        sqlx::query(
            "INSERT INTO observations (obs_key, product_id, location_id, price, created_at_ms)
             VALUES ('bad', 'milk', 'l1', 'not-a-price', 1000)",
        )
        .execute(repo.pool())
        .await
        .unwrap();
        repo.insert_observation(&obs("milk", "l1", "1.89", 2000))
            .await
            .unwrap();

        let results = repo
            .query_observations(&ProductId::new("milk".to_string()), None, None, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].price, Price::from_str_canonical("1.89").unwrap());
    }
}
