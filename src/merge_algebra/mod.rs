//! Three-way merge algebra (spec §4.5, C5).
//!
//! Walks the ordered [`AlignStep`] backbone from
//! [`crate::lcs::three_way_lcs`] and produces either a clean merge or a
//! conflicted one, plus the set of speculative per-origin migrations the
//! motion evaluator (C6) will later filter down to genuine move
//! propagations.
//!
//! # Per-step resolution, not whole-run comparison
//!
//! A pairwise tag (`BaseAndLeft`/`BaseAndRight`) only ties two of the three
//! sides together at one position; it says nothing about what the third
//! side did nearby. Comparing whole `base`/`left`/`right` runs between
//! `Common` anchors for equality — this module's previous approach — throws
//! that position-level pairing away, so a hunk containing both a pairwise
//! match *and* an unrelated insertion on the third side (spec §8 scenarios
//! "insertion opposite edit", "insertion opposite deletion", "coincident
//! deletion and edit") can't be told apart from an unrelated three-way
//! conflict once it's flattened into same-length-or-bust run comparison.
//!
//! This implementation instead walks the ordered step list directly.
//! Content that hasn't yet been tied to a match accumulates in `pending_*`
//! buffers; a `BaseAndLeft` step resolves using whatever the *other* side
//! (`pending_right`) has accumulated since the last resolution — edited to
//! that content if nonempty, deleted if empty — while the matching side's
//! own pending buffer (`pending_left`) is independent insertion content and
//! rides along regardless (the eager-edit rule: ambiguity between
//! insertion-plus-deletion and edit always resolves to edit). `DiffBase`
//! elements that never pair with anything are coincidentally dropped.
//! Anything still pending when a `Common` anchor (or the end of input) is
//! reached had no match at all and falls back to comparing the accumulated
//! runs directly, which is exactly spec §4.5's plain edit/conflict case.

use tracing::trace;

use crate::lcs::{three_way_lcs, AlignStep};
use crate::model::ContentMigration;

/// The canonical move the algebra took at one point in the merge (spec
/// §4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeMove {
    /// Content common to all three sides, carried through unchanged.
    Preservation,
    /// Both sides changed base's content to the same new content.
    CoincidentEdit,
    /// Both sides independently inserted the same new content.
    CoincidentInsertion,
    /// Only left changed base's content.
    LeftEdit,
    /// Only left deleted base's content.
    LeftDeletion,
    /// Only right changed base's content.
    RightEdit,
    /// Only right deleted base's content.
    RightDeletion,
    /// Only left inserted new content (no base content here).
    LeftInsertion,
    /// Only right inserted new content (no base content here).
    RightInsertion,
    /// Both sides changed base's content, to different things.
    EditConflict,
    /// Left edited, right deleted the same base content.
    LeftEditVsRightDeletionConflict,
    /// Right edited, left deleted the same base content.
    RightEditVsLeftDeletionConflict,
    /// Both sides deleted the same base content.
    CoincidentDeletion,
}

/// Either a clean merge, or a conflicted one carrying both sides (spec
/// §3, §6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeResult<T> {
    /// A single, conflict-free merged sequence.
    FullyMerged(Vec<T>),
    /// Diverging left/right sequences with conflict markers implied by
    /// their divergence (spec leaves marker rendering to the embedding
    /// tool; the core only hands back the two sequences).
    MergedWithConflicts(Vec<T>, Vec<T>),
}

impl<T> MergeResult<T> {
    /// `true` if this result is `FullyMerged`.
    #[must_use]
    pub const fn is_fully_merged(&self) -> bool {
        matches!(self, Self::FullyMerged(_))
    }
}

/// The full output of [`merge_sequences`]: the merge result itself, the
/// trace of canonical moves taken (spec §4.5), and speculative migrations
/// keyed by origin element (spec §4.6 input).
#[derive(Clone, Debug)]
pub struct MergeOutcome<T> {
    /// The clean or conflicted merge.
    pub result: MergeResult<T>,
    /// One [`MergeMove`] per resolved step, in order.
    pub moves: Vec<MergeMove>,
    /// Speculative migrations: for each base element whose content was
    /// edited or deleted on exactly one side, the fate that side gave it.
    /// Coincident and conflicted spans contribute no migrations (spec
    /// §4.6: "Coincident destinations do not receive propagated edits";
    /// conflicts have no single resolved fate to propagate).
    pub migrations: Vec<(T, ContentMigration<T>)>,
}

/// Run the three-way merge algebra over `base`/`left`/`right` under
/// `equivalent` (spec §4.5).
///
/// `size_of` feeds the LCS engine's score (spec §4.3); `equivalent` decides
/// whether two elements should be treated as the same content, whether by
/// raw equality or by shared match membership (spec §4.5 "equivalence
/// derived from matches").
pub fn merge_sequences<T: Clone>(
    base: &[T],
    left: &[T],
    right: &[T],
    equivalent: impl Fn(&T, &T) -> bool + Copy,
    size_of: impl Fn(&T) -> usize,
) -> MergeOutcome<T> {
    let tags = three_way_lcs(base, left, right, &equivalent, &size_of);

    let mut merged: Vec<T> = Vec::new();
    let mut forked: Option<(Vec<T>, Vec<T>)> = None;
    let mut moves = Vec::new();
    let mut migrations = Vec::new();

    let mut pending_base: Vec<T> = Vec::new();
    let mut pending_left: Vec<T> = Vec::new();
    let mut pending_right: Vec<T> = Vec::new();

    for step in tags.steps {
        match step {
            AlignStep::Common(value) => {
                flush_free_run(&mut pending_base, &mut pending_left, &mut pending_right, equivalent, &mut merged, &mut forked, &mut moves, &mut migrations);
                emit_clean(value, &mut merged, &mut forked);
                trace!(merge_move = ?MergeMove::Preservation, "resolved step");
                moves.push(MergeMove::Preservation);
            }
            AlignStep::LeftAndRight { left, right: _ } => {
                flush_free_run(&mut pending_base, &mut pending_left, &mut pending_right, equivalent, &mut merged, &mut forked, &mut moves, &mut migrations);
                // Both sides independently produced equivalent content; left is the
                // dominant representative (spec §3 `Match::dominant`).
                emit_clean(left, &mut merged, &mut forked);
                trace!(merge_move = ?MergeMove::CoincidentInsertion, "resolved step");
                moves.push(MergeMove::CoincidentInsertion);
            }
            AlignStep::BaseAndLeft { base, left } => {
                resolve_match(
                    base,
                    left,
                    &mut pending_left,
                    &mut pending_right,
                    &mut pending_base,
                    &mut merged,
                    &mut forked,
                    &mut moves,
                    &mut migrations,
                    MatchSide::Left,
                );
            }
            AlignStep::BaseAndRight { base, right } => {
                resolve_match(
                    base,
                    right,
                    &mut pending_right,
                    &mut pending_left,
                    &mut pending_base,
                    &mut merged,
                    &mut forked,
                    &mut moves,
                    &mut migrations,
                    MatchSide::Right,
                );
            }
            AlignStep::DiffBase(value) => pending_base.push(value),
            AlignStep::DiffLeft(value) => pending_left.push(value),
            AlignStep::DiffRight(value) => pending_right.push(value),
        }
    }

    flush_free_run(&mut pending_base, &mut pending_left, &mut pending_right, equivalent, &mut merged, &mut forked, &mut moves, &mut migrations);

    let result = match forked {
        None => MergeResult::FullyMerged(merged),
        Some((l, r)) => MergeResult::MergedWithConflicts(l, r),
    };

    MergeOutcome { result, moves, migrations }
}

/// Which side a pairwise match kept base's content on; the other side is
/// the "free" side whose pending buffer decides edit vs. deletion.
#[derive(Clone, Copy)]
enum MatchSide {
    Left,
    Right,
}

/// Resolve one `BaseAndLeft`/`BaseAndRight` step. `kept_extra` is the
/// pending buffer for the side that kept `base` (its own independent
/// insertions, unrelated to this match); `free_pending` is the other side's
/// pending buffer, which becomes this match's edit content if nonempty or
/// triggers a deletion if empty. `orphan_base` holds base elements that
/// matched neither side at all and are coincidentally dropped.
#[allow(clippy::too_many_arguments)]
fn resolve_match<T: Clone>(
    base: T,
    kept: T,
    kept_extra: &mut Vec<T>,
    free_pending: &mut Vec<T>,
    orphan_base: &mut Vec<T>,
    merged: &mut Vec<T>,
    forked: &mut Option<(Vec<T>, Vec<T>)>,
    moves: &mut Vec<MergeMove>,
    migrations: &mut Vec<(T, ContentMigration<T>)>,
    side: MatchSide,
) {
    if !orphan_base.is_empty() {
        orphan_base.clear();
        trace!(merge_move = ?MergeMove::CoincidentDeletion, "resolved orphaned base content at match");
        moves.push(MergeMove::CoincidentDeletion);
    }

    if !kept_extra.is_empty() {
        let extra = std::mem::take(kept_extra);
        emit_clean_seq(&extra, merged, forked);
        let mv = match side {
            MatchSide::Left => MergeMove::LeftInsertion,
            MatchSide::Right => MergeMove::RightInsertion,
        };
        trace!(merge_move = ?mv, "resolved independent insertion beside match");
        moves.push(mv);
    }

    if free_pending.is_empty() {
        migrations.push((base, ContentMigration::Deletion));
        let mv = match side {
            MatchSide::Left => MergeMove::RightDeletion,
            MatchSide::Right => MergeMove::LeftDeletion,
        };
        trace!(merge_move = ?mv, "resolved match via eager-edit rule");
        moves.push(mv);
        // `kept`'s content was dropped by the free side; nothing to emit.
        let _ = kept;
    } else {
        let replacement = std::mem::take(free_pending);
        migrations.push((base, ContentMigration::Edit(replacement.clone())));
        emit_clean_seq(&replacement, merged, forked);
        let mv = match side {
            MatchSide::Left => MergeMove::RightEdit,
            MatchSide::Right => MergeMove::LeftEdit,
        };
        trace!(merge_move = ?mv, "resolved match via eager-edit rule");
        moves.push(mv);
        let _ = kept;
    }
}

fn seq_equivalent<T>(a: &[T], b: &[T], equivalent: impl Fn(&T, &T) -> bool) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equivalent(x, y))
}

/// Resolve a span with no pairwise match at all (drained `pending_*`
/// buffers, compared as whole runs): exactly spec §4.5's plain
/// edit/deletion/conflict case, with no pairwise tag to disambiguate.
#[allow(clippy::too_many_arguments)]
fn flush_free_run<T: Clone>(
    pending_base: &mut Vec<T>,
    pending_left: &mut Vec<T>,
    pending_right: &mut Vec<T>,
    equivalent: impl Fn(&T, &T) -> bool + Copy,
    merged: &mut Vec<T>,
    forked: &mut Option<(Vec<T>, Vec<T>)>,
    moves: &mut Vec<MergeMove>,
    migrations: &mut Vec<(T, ContentMigration<T>)>,
) {
    if pending_base.is_empty() && pending_left.is_empty() && pending_right.is_empty() {
        return;
    }

    let base_run = std::mem::take(pending_base);
    let left_run = std::mem::take(pending_left);
    let right_run = std::mem::take(pending_right);

    let left_unchanged = seq_equivalent(&base_run, &left_run, equivalent);
    let right_unchanged = seq_equivalent(&base_run, &right_run, equivalent);
    let left_right_same = seq_equivalent(&left_run, &right_run, equivalent);

    if left_unchanged && right_unchanged {
        emit_clean_seq(&base_run, merged, forked);
        trace!(merge_move = ?MergeMove::Preservation, "resolved match-free run");
        moves.push(MergeMove::Preservation);
        return;
    }

    if left_unchanged {
        // Only right changed relative to base.
        record_migration(&base_run, &right_run, migrations);
        emit_clean_seq(&right_run, merged, forked);
        let mv = match (base_run.is_empty(), right_run.is_empty()) {
            (true, _) => MergeMove::RightInsertion,
            (false, true) => MergeMove::RightDeletion,
            (false, false) => MergeMove::RightEdit,
        };
        trace!(merge_move = ?mv, "resolved match-free run");
        moves.push(mv);
        return;
    }

    if right_unchanged {
        // Only left changed relative to base.
        record_migration(&base_run, &left_run, migrations);
        emit_clean_seq(&left_run, merged, forked);
        let mv = match (base_run.is_empty(), left_run.is_empty()) {
            (true, _) => MergeMove::LeftInsertion,
            (false, true) => MergeMove::LeftDeletion,
            (false, false) => MergeMove::LeftEdit,
        };
        trace!(merge_move = ?mv, "resolved match-free run");
        moves.push(mv);
        return;
    }

    if left_right_same {
        // Both sides changed base's content identically.
        emit_clean_seq(&left_run, merged, forked);
        let mv = match (base_run.is_empty(), left_run.is_empty()) {
            (true, _) => MergeMove::CoincidentInsertion,
            (false, true) => MergeMove::CoincidentDeletion,
            (false, false) => MergeMove::CoincidentEdit,
        };
        trace!(merge_move = ?mv, "resolved match-free run");
        moves.push(mv);
        return;
    }

    // Both sides changed base's content, and not to the same thing.
    emit_conflict(left_run.clone(), right_run.clone(), merged, forked);
    let mv = if left_run.is_empty() {
        MergeMove::RightEditVsLeftDeletionConflict
    } else if right_run.is_empty() {
        MergeMove::LeftEditVsRightDeletionConflict
    } else {
        MergeMove::EditConflict
    };
    trace!(merge_move = ?mv, "resolved match-free run");
    moves.push(mv);
}

fn record_migration<T: Clone>(base_run: &[T], changed_run: &[T], migrations: &mut Vec<(T, ContentMigration<T>)>) {
    let migration = if changed_run.is_empty() {
        ContentMigration::Deletion
    } else {
        ContentMigration::Edit(changed_run.to_vec())
    };
    for origin in base_run {
        migrations.push((origin.clone(), migration.clone()));
    }
}

fn emit_clean<T>(value: T, merged: &mut Vec<T>, forked: &mut Option<(Vec<T>, Vec<T>)>)
where
    T: Clone,
{
    match forked {
        None => merged.push(value),
        Some((l, r)) => {
            l.push(value.clone());
            r.push(value);
        }
    }
}

fn emit_clean_seq<T>(run: &[T], merged: &mut Vec<T>, forked: &mut Option<(Vec<T>, Vec<T>)>)
where
    T: Clone,
{
    match forked {
        None => merged.extend_from_slice(run),
        Some((l, r)) => {
            l.extend_from_slice(run);
            r.extend_from_slice(run);
        }
    }
}

fn emit_conflict<T: Clone>(left_run: Vec<T>, right_run: Vec<T>, merged: &mut Vec<T>, forked: &mut Option<(Vec<T>, Vec<T>)>) {
    let (l, r) = forked.get_or_insert_with(|| (merged.clone(), merged.clone()));
    l.extend(left_run);
    r.extend(right_run);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(a: &i64, b: &i64) -> bool {
        a == b
    }
    fn size(_: &i64) -> usize {
        1
    }

    /// spec §8 scenario 2: insertion opposite edit.
    #[test]
    fn insertion_opposite_edit() {
        let base = vec![1i64];
        let left = vec![2i64, 3];
        let right = vec![4i64];
        // matches: BaseAndLeft(1,2) -- model by making 1 and 2 equivalent.
        let outcome = merge_sequences(&base, &left, &right, |a, b| (*a == 1 && *b == 2) || (*a == 2 && *b == 1) || a == b, size);
        assert_eq!(outcome.result, MergeResult::FullyMerged(vec![4, 3]));
    }

    /// spec §8 scenario 3: insertion opposite deletion.
    #[test]
    fn insertion_opposite_deletion() {
        let base = vec![1i64];
        let left = vec![2i64, 3];
        let right: Vec<i64> = vec![];
        // matches: BaseAndLeft(1,3)
        let eq_13 = |a: &i64, b: &i64| (*a == 1 && *b == 3) || (*a == 3 && *b == 1) || a == b;
        let outcome = merge_sequences(&base, &left, &right, eq_13, size);
        assert_eq!(outcome.result, MergeResult::FullyMerged(vec![2]));
    }

    /// spec §8 scenario 5: coincident deletion + edit.
    #[test]
    fn coincident_deletion_and_edit() {
        let base = vec![1i64, 2];
        let left = vec![3i64];
        let right = vec![4i64];
        // matches: BaseAndLeft(2,3)
        let eq_23 = |a: &i64, b: &i64| (*a == 2 && *b == 3) || (*a == 3 && *b == 2) || a == b;
        let outcome = merge_sequences(&base, &left, &right, eq_23, size);
        assert_eq!(outcome.result, MergeResult::FullyMerged(vec![4]));
    }

    #[test]
    fn pure_edit_conflict() {
        let base = vec![1i64];
        let left = vec![2i64];
        let right = vec![3i64];
        let outcome = merge_sequences(&base, &left, &right, eq, size);
        assert_eq!(outcome.result, MergeResult::MergedWithConflicts(vec![2], vec![3]));
        assert_eq!(outcome.moves, vec![MergeMove::EditConflict]);
    }

    #[test]
    fn identical_inputs_are_idempotent() {
        let seq = vec![1i64, 2, 3];
        let outcome = merge_sequences(&seq, &seq, &seq, eq, size);
        assert_eq!(outcome.result, MergeResult::FullyMerged(seq));
    }

    #[test]
    fn single_side_deletion_records_migration() {
        let base = vec![1i64, 2, 3];
        let left = vec![1i64, 3];
        let right = vec![1i64, 2, 3];
        let outcome = merge_sequences(&base, &left, &right, eq, size);
        assert_eq!(outcome.result, MergeResult::FullyMerged(vec![1, 3]));
        assert_eq!(outcome.migrations, vec![(2, ContentMigration::Deletion)]);
    }

    /// A coincident insertion (matched via `LeftAndRight`) sandwiched
    /// between two preserved anchors still lands exactly once.
    #[test]
    fn coincident_insertion_is_applied_once() {
        let base = vec![1i64, 2];
        let left = vec![1i64, 9, 2];
        let right = vec![1i64, 9, 2];
        let outcome = merge_sequences(&base, &left, &right, eq, size);
        assert_eq!(outcome.result, MergeResult::FullyMerged(vec![1, 9, 2]));
    }

    /// An insertion on one side next to an unrelated single-side deletion
    /// in the same hunk must not be conflated into a conflict.
    #[test]
    fn insertion_next_to_unrelated_deletion_merges_cleanly() {
        let base = vec![1i64, 2, 3, 4];
        let left = vec![1i64, 9, 2, 3, 4];
        let right = vec![1i64, 2, 4];
        let outcome = merge_sequences(&base, &left, &right, eq, size);
        assert_eq!(outcome.result, MergeResult::FullyMerged(vec![1, 9, 2, 4]));
    }
}
