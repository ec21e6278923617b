//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Immutable settings shared by normalization and merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Decimal digits kept on millisecond values.
    /// Default: 2.
    pub precision: u32,

    /// Frame rate used for frame-index bounds when a document does not declare `fps`.
    /// Default: none (frame-index bounds then require a document `fps`).
    pub frame_rate: Option<f64>,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            precision: 2,
            frame_rate: None,
        }
    }
}

impl AlignConfig {
    /// Rounds a millisecond value to the configured precision.
    #[must_use]
    pub fn round(&self, ms: f64) -> f64 {
        crate::time::round_to(ms, self.precision)
    }
}
