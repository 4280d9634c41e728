//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `mod.rs` - reference data (chains, locations, products) and the cycle lookup
//! - `observations.rs` - price observation operations

mod observations;

use crate::domain::{
    Chain, ChainId, DealCycle, LocationId, Product, ProductId, RetailLocation, StartDay,
};
use crate::engine::CycleLookup;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::warn;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Chain operations
    // =========================================================================

    /// Upsert chains in a single transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn upsert_chains_batch(&self, chains: &[Chain]) -> Result<(), sqlx::Error> {
        if chains.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for chain in chains {
            sqlx::query(
                r#"
                INSERT INTO chains (chain_id, name, cycle_start_day)
                VALUES (?, ?, ?)
                ON CONFLICT(chain_id) DO UPDATE SET
                    name = excluded.name,
                    cycle_start_day = excluded.cycle_start_day
                "#,
            )
            .bind(chain.chain_id.as_str())
            .bind(&chain.name)
            .bind(chain.cycle.map(|c| c.start_day.as_u8() as i64))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Query all chains, ordered by id.
    ///
    /// A NULL or out-of-range start day column yields a chain without a
    /// cycle; its locations never validate.
    pub async fn query_chains(&self) -> Result<Vec<Chain>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT chain_id, name, cycle_start_day
            FROM chains
            ORDER BY chain_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let chains = rows
            .iter()
            .map(|row| {
                let chain_id: String = row.get("chain_id");
                let name: String = row.get("name");
                let start_day: Option<i64> = row.get("cycle_start_day");

                let cycle = start_day.and_then(|day| {
                    let parsed = StartDay::from_i64(day);
                    if parsed.is_none() {
                        warn!(
                            chain_id = %chain_id,
                            cycle_start_day = day,
                            "Chain has out-of-range cycle start day, treating as unconfigured"
                        );
                    }
                    parsed.map(DealCycle::new)
                });

                Chain::new(ChainId::new(chain_id), name, cycle)
            })
            .collect();

        Ok(chains)
    }

    /// Number of chains currently stored.
    pub async fn count_chains(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chains")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // =========================================================================
    // Location operations
    // =========================================================================

    /// Upsert retail locations in a single transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn upsert_locations_batch(
        &self,
        locations: &[RetailLocation],
    ) -> Result<(), sqlx::Error> {
        if locations.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for location in locations {
            sqlx::query(
                r#"
                INSERT INTO locations (location_id, chain_id, name)
                VALUES (?, ?, ?)
                ON CONFLICT(location_id) DO UPDATE SET
                    chain_id = excluded.chain_id,
                    name = excluded.name
                "#,
            )
            .bind(location.location_id.as_str())
            .bind(location.chain_id.as_str())
            .bind(&location.name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch a single location by id.
    pub async fn get_location(
        &self,
        location_id: &LocationId,
    ) -> Result<Option<RetailLocation>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT location_id, chain_id, name
            FROM locations
            WHERE location_id = ?
            "#,
        )
        .bind(location_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            RetailLocation::new(
                LocationId::new(r.get("location_id")),
                ChainId::new(r.get("chain_id")),
                r.get("name"),
            )
        }))
    }

    /// Build the location -> deal cycle lookup by joining locations to
    /// their chain's configuration.
    ///
    /// Locations whose chain has a NULL or malformed start day are omitted,
    /// so downstream evaluation fails closed for them.
    pub async fn cycle_lookup(&self) -> Result<CycleLookup, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT l.location_id, c.cycle_start_day
            FROM locations l
            JOIN chains c ON c.chain_id = l.chain_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut lookup = CycleLookup::new();
        for row in rows {
            let location_id: String = row.get("location_id");
            let start_day: Option<i64> = row.get("cycle_start_day");

            if let Some(day) = start_day.and_then(StartDay::from_i64) {
                lookup.insert(LocationId::new(location_id), DealCycle::new(day));
            }
        }

        Ok(lookup)
    }

    // =========================================================================
    // Product operations
    // =========================================================================

    /// Upsert products in a single transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn upsert_products_batch(&self, products: &[Product]) -> Result<(), sqlx::Error> {
        if products.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for product in products {
            sqlx::query(
                r#"
                INSERT INTO products (product_id, name)
                VALUES (?, ?)
                ON CONFLICT(product_id) DO UPDATE SET
                    name = excluded.name
                "#,
            )
            .bind(product.product_id.as_str())
            .bind(&product.name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Query all products, ordered by id.
    pub async fn query_products(&self) -> Result<Vec<Product>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, name
            FROM products
            ORDER BY product_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Product::new(ProductId::new(row.get("product_id")), row.get("name")))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::StartDay;
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

    fn chain(id: &str, start_day: Option<u8>) -> Chain {
        Chain::new(
            ChainId::new(id.to_string()),
            format!("{} stores", id),
            start_day.map(|d| DealCycle::new(StartDay::new(d).unwrap())),
        )
    }

    fn location(id: &str, chain_id: &str) -> RetailLocation {
        RetailLocation::new(
            LocationId::new(id.to_string()),
            ChainId::new(chain_id.to_string()),
            format!("{} branch", id),
        )
    }

    #[tokio::test]
    async fn test_upsert_and_query_chains() {
        let (repo, _temp) = setup_test_db().await;

        repo.upsert_chains_batch(&[chain("c1", Some(4)), chain("c2", None)])
            .await
            .expect("upsert failed");

        let chains = repo.query_chains().await.expect("query failed");
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].cycle.unwrap().start_day.as_u8(), 4);
        assert!(chains[1].cycle.is_none());
    }

    #[tokio::test]
    async fn test_upsert_chain_overwrites() {
        let (repo, _temp) = setup_test_db().await;

        repo.upsert_chains_batch(&[chain("c1", Some(4))]).await.unwrap();
        repo.upsert_chains_batch(&[chain("c1", Some(1))]).await.unwrap();

        let chains = repo.query_chains().await.unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].cycle.unwrap().start_day.as_u8(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_start_day_treated_as_unconfigured() {
        let (repo, _temp) = setup_test_db().await;

        sqlx::query("INSERT INTO chains (chain_id, name, cycle_start_day) VALUES ('c9', 'Nine', 9)")
            .execute(repo.pool())
            .await
            .unwrap();

        let chains = repo.query_chains().await.unwrap();
        assert!(chains[0].cycle.is_none());
    }

    #[tokio::test]
    async fn test_cycle_lookup_joins_and_fails_closed() {
        let (repo, _temp) = setup_test_db().await;

        repo.upsert_chains_batch(&[chain("c1", Some(4)), chain("c2", None)])
            .await
            .unwrap();
        repo.upsert_locations_batch(&[location("l1", "c1"), location("l2", "c2")])
            .await
            .unwrap();

        let lookup = repo.cycle_lookup().await.unwrap();
        assert_eq!(lookup.len(), 1);
        assert_eq!(
            lookup
                .get(&LocationId::new("l1".to_string()))
                .unwrap()
                .start_day
                .as_u8(),
            4
        );
        assert!(!lookup.contains_key(&LocationId::new("l2".to_string())));
    }

    #[tokio::test]
    async fn test_get_location() {
        let (repo, _temp) = setup_test_db().await;

        repo.upsert_chains_batch(&[chain("c1", Some(4))]).await.unwrap();
        repo.upsert_locations_batch(&[location("l1", "c1")]).await.unwrap();

        let found = repo
            .get_location(&LocationId::new("l1".to_string()))
            .await
            .unwrap();
        assert_eq!(found.unwrap().chain_id.as_str(), "c1");

        let missing = repo
            .get_location(&LocationId::new("nope".to_string()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_upsert_and_query_products() {
        let (repo, _temp) = setup_test_db().await;

        repo.upsert_products_batch(&[
            Product::new(ProductId::new("milk".to_string()), "Whole Milk 1L".to_string()),
            Product::new(ProductId::new("bread".to_string()), "Rye Bread".to_string()),
        ])
        .await
        .unwrap();

        let products = repo.query_products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product_id.as_str(), "bread");
    }
}
