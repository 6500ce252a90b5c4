//! Crate-wide error type for Kinetic Merge.
//!
//! Defines [`KineticMergeError`], the single error type the core returns.
//! Error messages are written to be actionable: a caller that surfaces one
//! verbatim should be able to tell what to do next without extra context.
//!
//! Merge conflicts are *not* represented here — they are a normal, structural
//! result ([`crate::merge_algebra::MergeResult::MergedWithConflicts`]), not an
//! error. Only the two "admissible failure" / "logic invariant" cases from
//! the design's error taxonomy live in this enum.

use std::fmt;

/// Unified error type for Kinetic Merge core operations.
#[derive(Debug)]
pub enum KineticMergeError {
    /// An ambiguous propagation: two or more distinct, non-equal candidate
    /// values (substitutions or anchored splices) target the same
    /// destination, and the core has no principled way to choose between
    /// them.
    AmbiguousPropagation {
        /// What the candidates are competing to set: `"substitution"` or
        /// `"anchored splice"`.
        kind: &'static str,
        /// Size (element count) of the destination section in conflict.
        destination_size: usize,
        /// Human-readable summaries of the competing candidates.
        candidates: Vec<String>,
    },

    /// A structural invariant of the core's own data model was violated.
    ///
    /// Never constructed from well-formed input; reserved for contract
    /// violations in a caller-supplied `Sources` (e.g. a `Section` indexed
    /// under a path it does not belong to).
    InvariantViolation {
        /// Human-readable description of the violated invariant.
        detail: String,
    },
}

impl fmt::Display for KineticMergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousPropagation {
                kind,
                destination_size,
                candidates,
            } => {
                write!(
                    f,
                    "ambiguous {kind} at a destination of size {destination_size}: {} distinct candidates ({}).\n  To fix: raise `minimum_ambiguous_match_size` above {destination_size} so matches of this size are no longer treated as ambiguous.",
                    candidates.len(),
                    candidates.join(", ")
                )
            }
            Self::InvariantViolation { detail } => {
                write!(f, "internal invariant violated: {detail}")
            }
        }
    }
}

impl std::error::Error for KineticMergeError {}

/// Convenience alias for fallible core operations.
pub type Result<T> = std::result::Result<T, KineticMergeError>;
