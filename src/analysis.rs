//! Top-level driver (spec §6 "Core API"): wires C1 sectioning, C4 discovery,
//! the per-path C3/C5 merge, C6 motion evaluation, C7 anchored-insertion
//! migration, and C8 rewriting into the two calls an embedding tool needs:
//! [`analyze`] for the read-only match report, and [`merge`] for the merged
//! trees.
//!
//! # Implementation note: migration authority
//!
//! A per-path merge ([`merge_algebra::merge_sequences`]) only ever sees one
//! path at a time and has no notion of "this empty run is empty because its
//! content moved elsewhere": it reports a move source's now-empty run as an
//! ordinary deletion, and a move source whose free side *also* independently
//! edited the same content (spec §8 "move with propagated edit") as an
//! ordinary conflict with no resolved migration at all. Neither answer is
//! what the motion evaluator needs. This driver therefore does not feed
//! [`crate::merge_algebra::MergeOutcome::migrations`] to [`evaluate_moves`]
//! at all; it uses only [`motion::derive_migrations`], which reads the free
//! side's content directly off each match rather than through the per-path
//! algebra and so never mistakes "moved away" for "deleted". See
//! `DESIGN.md` for the reasoning behind this choice.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::instrument;

use crate::anchor::migrate_anchored_insertions;
use crate::config::Config;
use crate::discovery::discover_matches;
use crate::error::Result;
use crate::merge_algebra::{merge_sequences, MergeResult};
use crate::model::{Element, Match, MatchesAndTheirSections, MoveDestinationsReport, Section, Sources};
use crate::motion::{derive_migrations, evaluate_moves};
use crate::progress::ProgressRecorder;
use crate::rewriter::rewrite_path;

/// Read-only view over a completed match discovery pass (spec §6
/// `CodeMotionAnalysis`).
#[derive(Clone, Debug)]
pub struct CodeMotionAnalysis<E> {
    /// The base tree's content.
    pub base: Sources<E>,
    /// The left tree's content.
    pub left: Sources<E>,
    /// The right tree's content.
    pub right: Sources<E>,
    matches: MatchesAndTheirSections<E>,
}

impl<E: Element> CodeMotionAnalysis<E> {
    /// Every match `section` participates in (spec §6
    /// `matchesFor(section) -> Set<Match>`).
    pub fn matches_for(&self, section: &Section<E>) -> impl Iterator<Item = &Match<E>> {
        self.matches.matches_for(section)
    }

    /// The full stabilized match set, for callers that want to inspect it
    /// directly rather than one section at a time.
    #[must_use]
    pub fn matches(&self) -> &MatchesAndTheirSections<E> {
        &self.matches
    }

    /// The move report implied by the stabilized match set, without running
    /// a full merge (spec §3, §6). Useful for a "what moved where" view that
    /// doesn't need substitutions or anchored splices resolved.
    #[must_use]
    pub fn move_report(&self) -> MoveDestinationsReport<E> {
        crate::motion::move_destinations_report(&self.matches)
    }
}

/// Two sections are equivalent for per-path merge purposes if they share a
/// match, or — for sections neither side has matched at all — if their
/// content is identical (spec §4.5 "equivalence derived from matches").
fn sections_equivalent<E: Element>(matches: &MatchesAndTheirSections<E>, a: &Section<E>, b: &Section<E>) -> bool {
    if a == b {
        return true;
    }
    if matches.matches_for(a).any(|m| m.involves(b)) {
        return true;
    }
    !matches.is_matched(a) && !matches.is_matched(b) && a.content() == b.content()
}

fn mandatory_for<E: Element>(matches: &MatchesAndTheirSections<E>, select: impl Fn(&Match<E>) -> Option<&Section<E>>) -> Vec<Section<E>> {
    matches.iter().filter_map(select).cloned().collect()
}

fn sections_for_path<'a, E>(files: &'a BTreeMap<Arc<str>, crate::model::File<E>>, path: &str) -> &'a [Section<E>] {
    files.get(path).map_or(&[], |f| f.sections())
}

/// Run match discovery only, without merging anything (spec §6
/// `CodeMotionAnalysis`, useful for a caller that only wants a move report
/// or a "what moved where" UI without committing to a merge).
#[must_use]
pub fn analyze<E: Element>(base: Sources<E>, left: Sources<E>, right: Sources<E>, config: &Config) -> CodeMotionAnalysis<E> {
    let matches = discover_matches(&base, &left, &right, config);
    CodeMotionAnalysis { base, left, right, matches }
}

/// Discover matches, merge every path, and evaluate code motion (spec §6
/// `merge() -> (Map<Path, MergeResult<Element>>, MoveDestinationsReport)`).
///
/// `progress` is driven once per phase: `"discovery"`, `"merge"`, and
/// `"rewrite"` (spec §6, §9 progress reporting).
///
/// # Errors
///
/// Returns [`crate::error::KineticMergeError::AmbiguousPropagation`] if a
/// substitution or an anchored splice has two distinct, non-equal
/// candidates with no principled way to choose between them (spec §4.6,
/// §4.7).
#[instrument(skip(base, left, right, progress))]
pub fn merge<E: Element>(
    base: Sources<E>,
    left: Sources<E>,
    right: Sources<E>,
    config: &Config,
    progress: &mut impl ProgressRecorder,
) -> Result<(BTreeMap<Arc<str>, MergeResult<E>>, MoveDestinationsReport<E>, CodeMotionAnalysis<E>)> {
    progress.new_session("discovery", 1);
    let matches = discover_matches(&base, &left, &right, config);
    progress.up_to(1);
    progress.close();
    tracing::debug!(matches = matches.len(), "match discovery complete");

    let mandatory_base = mandatory_for(&matches, Match::base);
    let mandatory_left = mandatory_for(&matches, Match::left);
    let mandatory_right = mandatory_for(&matches, Match::right);

    let base_files = base.files_by_path_utilising(&mandatory_base, None);
    let left_files = left.files_by_path_utilising(&mandatory_left, None);
    let right_files = right.files_by_path_utilising(&mandatory_right, None);

    let mut paths: Vec<Arc<str>> = base_files.keys().chain(left_files.keys()).chain(right_files.keys()).cloned().collect();
    paths.sort();
    paths.dedup();

    progress.new_session("merge", paths.len() as u64);
    let mut path_results: BTreeMap<Arc<str>, MergeResult<Section<E>>> = BTreeMap::new();
    for (i, path) in paths.iter().enumerate() {
        let base_secs = sections_for_path(&base_files, path);
        let left_secs = sections_for_path(&left_files, path);
        let right_secs = sections_for_path(&right_files, path);

        let outcome = merge_sequences(base_secs, left_secs, right_secs, |a, b| sections_equivalent(&matches, a, b), Section::size);
        path_results.insert(path.clone(), outcome.result);
        progress.up_to(i as u64 + 1);
    }
    progress.close();

    let migrations = derive_migrations(&matches, &left, &right);
    let evaluated = evaluate_moves(&matches, &migrations)?;
    tracing::debug!(
        moves = evaluated.move_destinations_report.len(),
        substitutions = evaluated.substitutions_by_destination.len(),
        anchored_moves = evaluated.anchored_moves.len(),
        "motion evaluation complete"
    );

    let splices = migrate_anchored_insertions(&evaluated.anchored_moves, &base_files, &left_files, &right_files, &matches)?;

    progress.new_session("rewrite", paths.len() as u64);
    let mut final_results = BTreeMap::new();
    for (i, (path, result)) in path_results.into_iter().enumerate() {
        final_results.insert(path, rewrite_path(result, &evaluated, &splices));
        progress.up_to(i as u64 + 1);
    }
    progress.close();

    let move_destinations_report = evaluated.move_destinations_report;
    Ok((final_results, move_destinations_report, CodeMotionAnalysis { base, left, right, matches }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;
    use crate::progress::NoopProgress;

    fn cfg() -> Config {
        Config::new(1, 0.0, usize::MAX).unwrap()
    }

    #[test]
    fn pure_edit_merges_cleanly() {
        let base = Sources::new(Side::Base, [("a.rs", vec![1u32, 2, 3])]);
        let left = Sources::new(Side::Left, [("a.rs", vec![1u32, 9, 3])]);
        let right = Sources::new(Side::Right, [("a.rs", vec![1u32, 2, 3])]);

        let mut progress = NoopProgress;
        let (results, _, _) = merge(base, left, right, &cfg(), &mut progress).unwrap();
        match results.get("a.rs").unwrap() {
            MergeResult::FullyMerged(content) => assert_eq!(content, &vec![1, 9, 3]),
            MergeResult::MergedWithConflicts(..) => panic!("expected a clean merge"),
        }
    }

    #[test]
    fn conflicting_edits_produce_a_conflict() {
        let base = Sources::new(Side::Base, [("a.rs", vec![1u32, 2, 3])]);
        let left = Sources::new(Side::Left, [("a.rs", vec![1u32, 8, 3])]);
        let right = Sources::new(Side::Right, [("a.rs", vec![1u32, 9, 3])]);

        let mut progress = NoopProgress;
        let (results, _, _) = merge(base, left, right, &cfg(), &mut progress).unwrap();
        assert!(matches!(results.get("a.rs").unwrap(), MergeResult::MergedWithConflicts(..)));
    }

    #[test]
    fn plain_move_relocates_content_with_no_substitution() {
        let base = Sources::new(Side::Base, [("a.rs", vec![10u32, 20, 30, 40, 50])]);
        let left = Sources::new(Side::Left, [("a.rs", vec![10u32, 50]), ("b.rs", vec![20u32, 30, 40])]);
        let right = Sources::new(Side::Right, [("a.rs", vec![10u32, 20, 30, 40, 50])]);

        let mut progress = NoopProgress;
        let (results, moves, _) = merge(base, left, right, &cfg(), &mut progress).unwrap();
        assert!(!moves.is_empty(), "the relocated run should appear in the move report");
        match results.get("b.rs").unwrap() {
            MergeResult::FullyMerged(content) => assert_eq!(content, &vec![20, 30, 40]),
            MergeResult::MergedWithConflicts(..) => panic!("expected the destination to merge cleanly"),
        }
    }
}
