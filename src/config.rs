//! Tunable thresholds for match discovery (spec §6).
//!
//! `Config` has no I/O of its own — loading it from a file or CLI flags is
//! the embedding tool's job (spec §1, §6) — but it derives `Serialize` /
//! `Deserialize` as an ambient convenience for embedders that do want to put
//! it in a config file.

use serde::{Deserialize, Serialize};

use crate::error::KineticMergeError;

/// Thresholds governing match discovery (C4) and ambiguity handling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Absolute floor on match window size, in elements.
    pub minimum_match_size: usize,

    /// Per-file fractional threshold: a section of length `L` in a file of
    /// size `F` is eligible only if
    /// `L >= max(minimum_match_size, floor(threshold * F))`.
    pub threshold_size_fraction_for_matching: f64,

    /// Window size at and above which *all* ambiguous matches for a
    /// fingerprint are retained; below it, only an unambiguous match is
    /// kept.
    pub minimum_ambiguous_match_size: usize,
}

impl Config {
    /// Construct a `Config`, validating that the threshold fraction is
    /// within `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`KineticMergeError::InvariantViolation`] if
    /// `threshold_size_fraction_for_matching` is outside `[0.0, 1.0]`.
    pub fn new(
        minimum_match_size: usize,
        threshold_size_fraction_for_matching: f64,
        minimum_ambiguous_match_size: usize,
    ) -> Result<Self, KineticMergeError> {
        if !(0.0..=1.0).contains(&threshold_size_fraction_for_matching) {
            return Err(KineticMergeError::InvariantViolation {
                detail: format!(
                    "threshold_size_fraction_for_matching must be in [0, 1], got {threshold_size_fraction_for_matching}"
                ),
            });
        }
        Ok(Self {
            minimum_match_size,
            threshold_size_fraction_for_matching,
            minimum_ambiguous_match_size,
        })
    }

    /// The per-file eligibility threshold for a file of size `file_size`:
    /// `max(minimum_match_size, floor(threshold * file_size))`.
    #[must_use]
    pub fn per_file_threshold(&self, file_size: usize) -> usize {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let fractional = (self.threshold_size_fraction_for_matching * file_size as f64).floor() as usize;
        self.minimum_match_size.max(fractional)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minimum_match_size: 1,
            threshold_size_fraction_for_matching: 0.0,
            minimum_ambiguous_match_size: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_fraction() {
        assert!(Config::new(1, 1.5, 1).is_err());
        assert!(Config::new(1, -0.1, 1).is_err());
    }

    #[test]
    fn per_file_threshold_takes_the_max() {
        let cfg = Config::new(5, 0.5, 10).unwrap();
        assert_eq!(cfg.per_file_threshold(4), 5);
        assert_eq!(cfg.per_file_threshold(20), 10);
    }
}
