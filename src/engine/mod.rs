//! Pure computation engine for deal-cycle evaluation.

pub mod digest;
pub mod evaluator;
pub mod window;

pub use digest::DealEntry;
pub use evaluator::{CycleLookup, DealEvaluator, TiePolicy};
pub use window::{CycleWindow, CYCLE_LEN_MS};

/// Derived classification of one observation, recomputed on every pass and
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceFlags {
    /// Within the currently active deal window of its location's chain.
    pub is_valid: bool,
    /// Lowest valid price for its product across all locations.
    pub is_master_price: bool,
}
