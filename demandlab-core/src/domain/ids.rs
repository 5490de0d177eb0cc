use serde::{Deserialize, Serialize};
use std::fmt;

use super::params::RunParameters;

/// Content hash of an input table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a training run: which data, which item, which parameters.
///
/// A trained model keeps the fingerprint it was fit under; comparing it with
/// the fingerprint of the current inputs tells whether the model is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub dataset: DatasetHash,
    pub item: String,
    pub params: RunParameters,
}

impl RunFingerprint {
    pub fn new(dataset: DatasetHash, item: impl Into<String>, params: RunParameters) -> Self {
        Self {
            dataset,
            item: item.into(),
            params,
        }
    }

    /// Deterministic BLAKE3 hash over the canonical JSON form.
    pub fn hash(&self) -> String {
        let canonical = serde_json::json!({
            "dataset": &self.dataset.0,
            "item": &self.item,
            "horizon_days": self.params.horizon_days(),
            "confidence": self.params.confidence(),
            "hold_out": self.params.hold_out(),
            "trend": self.params.trend().as_str(),
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }

    /// True when a model fit under `self` must be refit to honour `current`.
    ///
    /// The horizon is excluded: it only changes the forecast extension, which
    /// is re-derived from the trained model without refitting.
    pub fn requires_refit(&self, current: &RunFingerprint) -> bool {
        self.dataset != current.dataset
            || self.item != current.item
            || self.params.confidence() != current.params.confidence()
            || self.params.hold_out() != current.params.hold_out()
            || self.params.trend() != current.params.trend()
    }
}
