//! Deals digest: the best current deal per product.
//!
//! This is the computation behind the `/v1/deals` endpoint and the weekly
//! deal reminder the mobile client shows for a shopping list.

use crate::domain::ordering::sort_observations_deterministic;
use crate::domain::{Price, PriceObservation, ProductId, TimeMs};
use crate::engine::{CycleLookup, DealEvaluator};

/// The best current deal for one product: the master price and every
/// observation carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealEntry {
    pub product: ProductId,
    pub best_price: Price,
    /// Master-price observations, deterministically ordered. Under the
    /// multi-winner tie policy this may list several locations.
    pub observations: Vec<PriceObservation>,
}

impl DealEvaluator {
    /// Build the digest for a set of products, all judged against one
    /// captured `now`. Products with no valid observation are omitted.
    pub fn build_digest(
        &self,
        per_product: Vec<(ProductId, Vec<PriceObservation>)>,
        cycles: &CycleLookup,
        now: TimeMs,
    ) -> Vec<DealEntry> {
        let mut entries = Vec::new();

        for (product, observations) in per_product {
            let flags = self.evaluate_batch(&observations, cycles, now);
            let mut masters: Vec<PriceObservation> = observations
                .into_iter()
                .zip(flags)
                .filter(|(_, f)| f.is_master_price)
                .map(|(o, _)| o)
                .collect();

            let Some(best_price) = masters.iter().map(|o| o.price).min() else {
                continue;
            };
            sort_observations_deterministic(&mut masters);

            entries.push(DealEntry {
                product,
                best_price,
                observations: masters,
            });
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DealCycle, LocationId, StartDay};
    use crate::engine::TiePolicy;

    // 2025-01-06 (a Monday), noon UTC.
    const NOW: TimeMs = TimeMs(1_736_164_800_000);
    const DAY_MS: i64 = 86_400_000;

    fn obs(product: &str, location: &str, price: &str, created_at: i64) -> PriceObservation {
        PriceObservation::new(
            ProductId::new(product.to_string()),
            LocationId::new(location.to_string()),
            Price::from_str_canonical(price).unwrap(),
            TimeMs::new(created_at),
            None,
        )
    }

    fn lookup(entries: &[(&str, u8)]) -> CycleLookup {
        entries
            .iter()
            .map(|(loc, day)| {
                (
                    LocationId::new(loc.to_string()),
                    DealCycle::new(StartDay::new(*day).unwrap()),
                )
            })
            .collect()
    }

    #[test]
    fn test_digest_picks_best_price_per_product() {
        let e = DealEvaluator::utc(TiePolicy::All);
        let cycles = lookup(&[("loc-a", 1), ("loc-b", 1)]);
        let per_product = vec![(
            ProductId::new("milk".to_string()),
            vec![
                obs("milk", "loc-a", "1.89", NOW.as_ms() - 3_600_000),
                obs("milk", "loc-b", "2.09", NOW.as_ms() - 3_600_000),
            ],
        )];

        let digest = e.build_digest(per_product, &cycles, NOW);
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].best_price, Price::from_str_canonical("1.89").unwrap());
        assert_eq!(digest[0].observations.len(), 1);
        assert_eq!(digest[0].observations[0].location.as_str(), "loc-a");
    }

    #[test]
    fn test_digest_lists_every_tied_location() {
        let e = DealEvaluator::utc(TiePolicy::All);
        let cycles = lookup(&[("loc-a", 1), ("loc-b", 1)]);
        let per_product = vec![(
            ProductId::new("milk".to_string()),
            vec![
                obs("milk", "loc-a", "1.89", NOW.as_ms() - 7_200_000),
                obs("milk", "loc-b", "1.89", NOW.as_ms() - 3_600_000),
            ],
        )];

        let digest = e.build_digest(per_product, &cycles, NOW);
        assert_eq!(digest[0].observations.len(), 2);
    }

    #[test]
    fn test_digest_omits_products_without_valid_observations() {
        let e = DealEvaluator::utc(TiePolicy::All);
        let cycles = lookup(&[("loc-a", 1)]);
        let per_product = vec![
            (
                ProductId::new("milk".to_string()),
                vec![obs("milk", "loc-a", "1.89", NOW.as_ms() - 3_600_000)],
            ),
            (
                ProductId::new("bread".to_string()),
                vec![obs("bread", "loc-a", "3.50", NOW.as_ms() - 30 * DAY_MS)],
            ),
            (ProductId::new("eggs".to_string()), vec![]),
        ];

        let digest = e.build_digest(per_product, &cycles, NOW);
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].product.as_str(), "milk");
    }
}
