//! Domain types and determinism layer for the price-comparison backend.
//!
//! This module provides:
//! - Lossless price handling via the Price wrapper
//! - Domain primitives: TimeMs, ProductId, LocationId, ChainId
//! - DealCycle configuration and PriceObservation records
//! - Stable observation ordering for deterministic processing

pub mod catalog;
pub mod cycle;
pub mod observation;
pub mod ordering;
pub mod price;
pub mod primitives;

pub use catalog::{Chain, Product, RetailLocation};
pub use cycle::{DealCycle, StartDay};
pub use observation::PriceObservation;
pub use ordering::ObservationOrderingKey;
pub use price::Price;
pub use primitives::{ChainId, LocationId, ProductId, TimeMs};
