//! Kinetic Merge — three-way merge of source trees that accounts for code
//! motion (moves, splits, and duplications), not just line-level diffing.
//!
//! [`analyze`] discovers matches without merging anything; [`merge`] runs
//! the full pipeline and returns a per-path merge result alongside the move
//! report. Both take [`Sources`] built from whatever the embedding tool
//! already tokenized the three trees into, and a [`Config`] governing match
//! discovery's size thresholds.

pub mod anchor;
pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod lcs;
pub mod merge_algebra;
pub mod model;
pub mod motion;
pub mod progress;
pub mod rewriter;

pub use analysis::{analyze, merge, CodeMotionAnalysis};
pub use config::Config;
pub use error::{KineticMergeError, Result};
pub use merge_algebra::{MergeMove, MergeOutcome, MergeResult};
pub use model::{ContentMigration, DominantsKey, Element, File, Match, MatchKind, MatchesAndTheirSections, MoveDestinations, MoveDestinationsReport, Section, Side, Sources};
pub use progress::{NoopProgress, ProgressRecorder};
