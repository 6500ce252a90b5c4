//! Result rewriter (spec §4.8, C8).
//!
//! The last stage: takes each path's per-section [`MergeResult`] from C5,
//! the substitutions and suppressions C6 resolved, and the splices C7
//! computed, and produces the final element-level [`MergeResult`] a caller
//! actually wants. Four steps, applied in order, per spec §4.8:
//!
//! 1. **Suppression** — drop sections consumed by an anchored splice or
//!    whose migration was propagated elsewhere (spec §4.6
//!    `migratedEditSuppressions`).
//! 2. **Anchored splicing** — insert C7's replacement content immediately
//!    before/after the anchor it targets.
//! 3. **Substitution** — replace a move destination's content with the
//!    migration C6 resolved for it, unless doing so would be a no-op.
//! 4. **Explosion** — flatten sections back down to elements; a conflict
//!    that turns out identical on both sides after substitution collapses
//!    back to a clean merge.

use crate::anchor::{AnchorSpliceMap, Direction};
use crate::merge_algebra::MergeResult;
use crate::model::{ContentMigration, Element, Section};
use crate::motion::EvaluatedMoves;

fn is_suppressed<E: Element>(section: &Section<E>, evaluated: &EvaluatedMoves<E>, splices: &AnchorSpliceMap<E>) -> bool {
    splices.is_consumed(section) || evaluated.migrated_edit_suppressions.contains(section)
}

/// Replace `section` with whatever C6 resolved for it, unless the
/// resolution is a no-op (spec §4.8 step 3: "if the substitution content
/// equals the destination's own content, treat it as a no-op").
fn apply_substitution<E: Element>(section: &Section<E>, evaluated: &EvaluatedMoves<E>) -> Vec<Section<E>> {
    match evaluated.substitutions_by_destination.get(section) {
        None | Some(ContentMigration::PlainMove) => vec![section.clone()],
        Some(ContentMigration::Deletion) => vec![],
        Some(ContentMigration::Edit(new_sections)) => {
            let new_content: Vec<&E> = new_sections.iter().flat_map(Section::content).collect();
            let own_content: Vec<&E> = section.content().iter().collect();
            if new_content == own_content {
                vec![section.clone()]
            } else {
                new_sections.clone()
            }
        }
    }
}

/// Apply suppression, anchored splicing, and substitution to one side's
/// section sequence, in that order (spec §4.8 steps 1-3).
fn rewrite_sequence<E: Element>(
    sections: &[Section<E>],
    evaluated: &EvaluatedMoves<E>,
    splices: &AnchorSpliceMap<E>,
) -> Vec<Section<E>> {
    let mut out = Vec::new();
    let mut deferred: Option<Vec<Section<E>>> = None;

    for section in sections {
        if is_suppressed(section, evaluated, splices) {
            continue;
        }

        if let Some(predecessor) = splices.splice_for(section, Direction::Predecessor) {
            if let Some(pending) = deferred.take() {
                out.extend(pending);
            }
            out.extend(predecessor.iter().cloned());
        } else if let Some(pending) = deferred.take() {
            out.extend(pending);
        }

        out.extend(apply_substitution(section, evaluated));

        if let Some(successor) = splices.splice_for(section, Direction::Successor) {
            deferred = Some(successor.to_vec());
        }
    }

    if let Some(pending) = deferred.take() {
        out.extend(pending);
    }

    out
}

fn explode<E: Element>(sections: &[Section<E>]) -> Vec<E> {
    sections.iter().flat_map(|s| s.content().iter().cloned()).collect()
}

/// Rewrite one path's section-level merge result into the final
/// element-level result (spec §4.8).
///
/// Collapses a conflict back to [`MergeResult::FullyMerged`] if the two
/// sides become equal, element for element, after substitution (spec §4.8
/// step 4: "late conflict collapse").
#[must_use]
pub fn rewrite_path<E: Element>(
    result: MergeResult<Section<E>>,
    evaluated: &EvaluatedMoves<E>,
    splices: &AnchorSpliceMap<E>,
) -> MergeResult<E> {
    match result {
        MergeResult::FullyMerged(sections) => {
            let rewritten = rewrite_sequence(&sections, evaluated, splices);
            MergeResult::FullyMerged(explode(&rewritten))
        }
        MergeResult::MergedWithConflicts(left, right) => {
            let left_rewritten = explode(&rewrite_sequence(&left, evaluated, splices));
            let right_rewritten = explode(&rewrite_sequence(&right, evaluated, splices));
            if left_rewritten == right_rewritten {
                MergeResult::FullyMerged(left_rewritten)
            } else {
                MergeResult::MergedWithConflicts(left_rewritten, right_rewritten)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Side, Sources};
    use std::collections::{HashMap, HashSet};

    fn evaluated_with_substitution<E: Element + Default>(dest: Section<E>, migration: ContentMigration<Section<E>>) -> EvaluatedMoves<E> {
        let mut substitutions_by_destination = HashMap::new();
        substitutions_by_destination.insert(dest, migration);
        EvaluatedMoves {
            substitutions_by_destination,
            migrated_edit_suppressions: HashSet::new(),
            ..EvaluatedMoves::default()
        }
    }

    #[test]
    fn plain_sections_explode_into_elements() {
        let src = Sources::new(Side::Left, [("a.rs", vec![1u32, 2, 3])]);
        let section = src.section("a.rs", 0, 3).unwrap();
        let evaluated = EvaluatedMoves::default();
        let splices = AnchorSpliceMap::default();
        let result = rewrite_path(MergeResult::FullyMerged(vec![section]), &evaluated, &splices);
        assert_eq!(result, MergeResult::FullyMerged(vec![1, 2, 3]));
    }

    #[test]
    fn substitution_replaces_destination_content() {
        let src = Sources::new(Side::Left, [("a.rs", vec![1u32, 2, 3])]);
        let dest = src.section("a.rs", 0, 3).unwrap();
        let replacement_src = Sources::new(Side::Right, [("b.rs", vec![9u32, 9])]);
        let replacement = replacement_src.section("b.rs", 0, 2).unwrap();

        let evaluated = evaluated_with_substitution(dest.clone(), ContentMigration::Edit(vec![replacement]));
        let splices = AnchorSpliceMap::default();
        let result = rewrite_path(MergeResult::FullyMerged(vec![dest]), &evaluated, &splices);
        assert_eq!(result, MergeResult::FullyMerged(vec![9, 9]));
    }

    #[test]
    fn deletion_substitution_drops_the_destination() {
        let src = Sources::new(Side::Left, [("a.rs", vec![1u32, 2, 3])]);
        let dest = src.section("a.rs", 0, 3).unwrap();

        let evaluated = evaluated_with_substitution(dest.clone(), ContentMigration::Deletion);
        let splices = AnchorSpliceMap::default();
        let result = rewrite_path(MergeResult::FullyMerged(vec![dest]), &evaluated, &splices);
        assert_eq!(result, MergeResult::FullyMerged(vec![]));
    }

    #[test]
    fn suppressed_section_is_dropped() {
        let src = Sources::new(Side::Left, [("a.rs", vec![1u32, 2, 3])]);
        let section = src.section("a.rs", 0, 3).unwrap();

        let mut migrated_edit_suppressions = HashSet::new();
        migrated_edit_suppressions.insert(section.clone());
        let evaluated = EvaluatedMoves {
            migrated_edit_suppressions,
            ..EvaluatedMoves::default()
        };
        let splices = AnchorSpliceMap::default();
        let result = rewrite_path(MergeResult::FullyMerged(vec![section]), &evaluated, &splices);
        assert_eq!(result, MergeResult::FullyMerged(vec![]));
    }

    #[test]
    fn conflict_collapses_once_substitution_makes_both_sides_equal() {
        let left_src = Sources::new(Side::Left, [("a.rs", vec![1u32, 2])]);
        let right_src = Sources::new(Side::Right, [("a.rs", vec![9u32, 9])]);
        let left_section = left_src.section("a.rs", 0, 2).unwrap();
        let right_section = right_src.section("a.rs", 0, 2).unwrap();

        let evaluated = evaluated_with_substitution(left_section.clone(), ContentMigration::Edit(vec![right_section.clone()]));
        let splices = AnchorSpliceMap::default();
        let result = rewrite_path(MergeResult::MergedWithConflicts(vec![left_section], vec![right_section]), &evaluated, &splices);
        assert_eq!(result, MergeResult::FullyMerged(vec![9, 9]));
    }
}
