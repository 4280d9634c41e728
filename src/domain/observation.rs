//! PriceObservation: a single user-submitted price record.

use crate::domain::{LocationId, Price, ProductId, TimeMs};
use serde::{Deserialize, Serialize};

/// A price a user observed for a product at a retail location.
///
/// Immutable once created. The derived validity/master flags are computed
/// by the engine on every evaluation pass and are never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Stable unique identifier for this observation.
    pub obs_key: String,
    /// Product the price was observed for.
    pub product: ProductId,
    /// Retail location where the price was observed.
    pub location: LocationId,
    /// Observed shelf price.
    pub price: Price,
    /// Submission time in milliseconds since Unix epoch.
    pub created_at: TimeMs,
    /// Upstream document id, when the record came from the hosted backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl PriceObservation {
    /// Create a new PriceObservation with a computed stable key.
    pub fn new(
        product: ProductId,
        location: LocationId,
        price: Price,
        created_at: TimeMs,
        source_id: Option<String>,
    ) -> Self {
        let obs_key = Self::compute_obs_key(
            &product,
            &location,
            &price,
            created_at,
            source_id.as_deref(),
        );
        PriceObservation {
            obs_key,
            product,
            location,
            price,
            created_at,
            source_id,
        }
    }

    /// Generate a stable unique key for this observation.
    ///
    /// Priority: upstream `source_id` (if present) > hash of deterministic fields.
    pub fn compute_obs_key(
        product: &ProductId,
        location: &LocationId,
        price: &Price,
        created_at: TimeMs,
        source_id: Option<&str>,
    ) -> String {
        if let Some(id) = source_id {
            return format!("src:{}", id);
        }

        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(product.as_str());
        hasher.update(b"\x1f");
        hasher.update(location.as_str());
        hasher.update(b"\x1f");
        hasher.update(price.to_canonical_string());
        hasher.update(created_at.as_ms().to_le_bytes());
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }

    /// Borrow the precomputed observation key.
    pub fn obs_key(&self) -> &str {
        &self.obs_key
    }
}
