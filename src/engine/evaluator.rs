//! Deal-cycle evaluator: classifies price observations against the active
//! deal window of their location's chain and flags master prices.
//!
//! Pure and stateless. Every operation takes the evaluation instant as an
//! explicit argument so a whole batch is judged against one captured "now";
//! nothing here reads the clock or caches results between calls.

use crate::domain::{DealCycle, LocationId, PriceObservation, TimeMs};
use crate::engine::window::CycleWindow;
use crate::engine::PriceFlags;
use chrono::FixedOffset;
use std::collections::HashMap;

/// Lookup from a location to its chain's deal cycle.
///
/// Locations whose chain has no (or a malformed) cycle configuration are
/// absent; their observations evaluate as invalid.
pub type CycleLookup = HashMap<LocationId, DealCycle>;

/// How equal minimum prices are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiePolicy {
    /// Every observation matching the minimum is a master price.
    All,
    /// Single winner: the earliest submission, obs-key tie-break.
    Earliest,
}

/// Stateless classifier for price observations.
#[derive(Debug, Clone, Copy)]
pub struct DealEvaluator {
    offset: FixedOffset,
    tie_policy: TiePolicy,
}

impl DealEvaluator {
    /// Create an evaluator with the given local-midnight offset and tie policy.
    pub fn new(offset: FixedOffset, tie_policy: TiePolicy) -> Self {
        Self { offset, tie_policy }
    }

    /// Evaluator anchored to UTC midnights.
    pub fn utc(tie_policy: TiePolicy) -> Self {
        use chrono::Offset;
        Self::new(chrono::Utc.fix(), tie_policy)
    }

    /// True iff `created_at` falls within the deal window active at `now`.
    ///
    /// Fails closed: no cycle means no window means invalid. There is no
    /// "no cycle = always valid" interpretation.
    pub fn is_within_current_cycle(
        &self,
        created_at: TimeMs,
        cycle: Option<&DealCycle>,
        now: TimeMs,
    ) -> bool {
        let Some(cycle) = cycle else {
            return false;
        };
        match CycleWindow::containing(now, cycle.start_day, self.offset) {
            Some(window) => window.contains(created_at),
            None => false,
        }
    }

    /// True iff the observation carries a usable price and sits inside its
    /// own location's active window. Non-positive prices are malformed and
    /// never valid.
    fn is_valid(&self, obs: &PriceObservation, cycles: &CycleLookup, now: TimeMs) -> bool {
        obs.price.is_positive()
            && self.is_within_current_cycle(obs.created_at, cycles.get(&obs.location), now)
    }

    /// True iff `obs` is a master price among `all_for_product`.
    ///
    /// Each candidate is judged against its own location's cycle; chains
    /// differ in start day, so there is no single global window. Fails
    /// closed on empty inputs.
    pub fn is_master_price(
        &self,
        obs: &PriceObservation,
        all_for_product: &[PriceObservation],
        cycles: &CycleLookup,
        now: TimeMs,
    ) -> bool {
        if all_for_product.is_empty() || cycles.is_empty() {
            return false;
        }
        if !self.is_valid(obs, cycles, now) {
            return false;
        }

        let valid: Vec<&PriceObservation> = all_for_product
            .iter()
            .filter(|o| self.is_valid(o, cycles, now))
            .collect();

        let Some(min_price) = valid.iter().map(|o| o.price).min() else {
            return false;
        };

        match self.tie_policy {
            TiePolicy::All => obs.price == min_price,
            TiePolicy::Earliest => {
                let winner = valid
                    .iter()
                    .filter(|o| o.price == min_price)
                    .min_by_key(|o| (o.created_at, o.obs_key().to_string()));
                winner.map(|w| w.obs_key() == obs.obs_key()).unwrap_or(false)
            }
        }
    }

    /// Evaluate a whole product's observations against one captured `now`.
    ///
    /// Returns one `PriceFlags` per input observation, in input order.
    pub fn evaluate_batch(
        &self,
        observations: &[PriceObservation],
        cycles: &CycleLookup,
        now: TimeMs,
    ) -> Vec<PriceFlags> {
        let validity: Vec<bool> = observations
            .iter()
            .map(|o| self.is_valid(o, cycles, now))
            .collect();

        let min_price = observations
            .iter()
            .zip(&validity)
            .filter(|(_, valid)| **valid)
            .map(|(o, _)| o.price)
            .min();

        let winner_key: Option<&str> = match (self.tie_policy, min_price) {
            (TiePolicy::Earliest, Some(min)) => observations
                .iter()
                .zip(&validity)
                .filter(|(o, valid)| **valid && o.price == min)
                .map(|(o, _)| o)
                .min_by_key(|o| (o.created_at, o.obs_key().to_string()))
                .map(|o| o.obs_key()),
            _ => None,
        };

        observations
            .iter()
            .zip(validity)
            .map(|(obs, is_valid)| {
                let is_master_price = match (min_price, self.tie_policy) {
                    (None, _) => false,
                    (Some(min), TiePolicy::All) => is_valid && obs.price == min,
                    (Some(_), TiePolicy::Earliest) => {
                        is_valid && Some(obs.obs_key()) == winner_key
                    }
                };
                PriceFlags {
                    is_valid,
                    is_master_price,
                }
            })
            .collect()
    }
}
