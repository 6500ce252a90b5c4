//! Anchored-insertion migrator (spec §4.7, C7).
//!
//! A move only relocates the content that was actually matched. Content one
//! side inserted immediately next to where that content used to live — and
//! which the other side therefore never saw at the new location — should
//! ride along with the move rather than stay stranded at the origin. This
//! module finds those runs and reconciles them with
//! [`crate::merge_algebra::merge_sequences`], the same three-way algebra C5
//! uses for the main per-path merge, treating the run immediately before
//! (and after) the move as a tiny merge problem of its own.
//!
//! # Implementation note: boundary detection
//!
//! Spec §4.7 distinguishes "interrupted by a preservation, another anchor,
//! or a coincident edit/insertion" as three different reasons a run stops
//! growing. This implementation uses one unified boundary: any section that
//! participates in *some* match ([`MatchesAndTheirSections::is_matched`]).
//! A preservation, another move's anchor, and a coincident-insertion
//! destination are all matched sections, so this test subsumes all three
//! named cases; it does not additionally stop at an unmatched-but-identical
//! coincident edit the LCS happened not to turn into a match, which spec
//! §9's allowance for omitted-at-the-cost-of-extra-work heuristics covers.
//!
//! # Implementation note: locating the opposite side's run
//!
//! When the move's own `AllSides` match already names a section that stayed
//! behind on the side opposite the destination, that section is used
//! directly ([`crate::motion::AnchoredMove::opposite`]). Pairwise moves name
//! no such section, so this implementation falls back to looking up the
//! opposite file's section at the origin's own start offset
//! ([`File::section_at`]) as a stand-in for that alignment. When the
//! opposite side hasn't itself moved or resectioned that stretch of the
//! path (the common case this fallback exists for), the offsets agree; when
//! they don't, the anchored move is simply skipped — a conservative
//! fallback, not a silent miscorrelation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{KineticMergeError, Result};
use crate::merge_algebra::{merge_sequences, MergeResult};
use crate::model::{Element, File, MatchesAndTheirSections, Section, Side};
use crate::motion::AnchoredMove;

/// Which side of an anchor a splice attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Immediately before the anchor, in file order.
    Predecessor,
    /// Immediately after the anchor, in file order.
    Successor,
}

/// The splices computed by [`migrate_anchored_insertions`]: per-anchor
/// replacement content for the run immediately touching it, plus the set of
/// origin-side and opposite-side sections each splice consumed (spec §4.7,
/// §4.8 "suppression").
#[derive(Clone, Debug, Default)]
pub struct AnchorSpliceMap<E> {
    splices: HashMap<(Section<E>, Direction), Vec<Section<E>>>,
    consumed: HashSet<Section<E>>,
}

impl<E> AnchorSpliceMap<E> {
    /// The replacement content for the run touching `anchor` on `direction`,
    /// if one side contributed something new there.
    #[must_use]
    pub fn splice_for(&self, anchor: &Section<E>, direction: Direction) -> Option<&[Section<E>]> {
        self.splices.get(&(anchor.clone(), direction)).map(Vec::as_slice)
    }

    /// `true` if `section` was folded into a splice and must not also be
    /// emitted at its original location.
    #[must_use]
    pub fn is_consumed(&self, section: &Section<E>) -> bool
    where
        E: Element,
    {
        self.consumed.contains(section)
    }
}

fn section_content_equivalent<E: Element>(a: &Section<E>, b: &Section<E>) -> bool {
    a.content() == b.content()
}

/// The maximal run of consecutive unmatched sections immediately before and
/// after `index` in `file` (spec §4.7 "maximal adjoining run"), in ascending
/// file order.
fn neighbors<E: Element>(file: &File<E>, index: usize, matches: &MatchesAndTheirSections<E>) -> (Vec<Section<E>>, Vec<Section<E>>) {
    let sections = file.sections();

    let mut predecessor = Vec::new();
    let mut i = index;
    while i > 0 {
        let candidate = &sections[i - 1];
        if matches.is_matched(candidate) {
            break;
        }
        predecessor.push(candidate.clone());
        i -= 1;
    }
    predecessor.reverse();

    let mut successor = Vec::new();
    let mut j = index + 1;
    while j < sections.len() {
        let candidate = &sections[j];
        if matches.is_matched(candidate) {
            break;
        }
        successor.push(candidate.clone());
        j += 1;
    }

    (predecessor, successor)
}

/// Compute anchored-insertion splices for every move in `anchored_moves`
/// (spec §4.7). `{base,left,right}_files` are the per-path sectionings
/// produced for the main per-path merge; they must have been built with the
/// full stabilized match set as mandatory sections so that `is_matched`
/// boundaries line up with the files passed in.
///
/// # Errors
///
/// Returns [`KineticMergeError::AmbiguousPropagation`] if the destination-
/// side run and the opposite-side run around an anchor conflict under the
/// three-way algebra — two genuinely different ideas of what should appear
/// next to the moved content, with no principled way to choose (spec §4.7
/// "ambiguous splice collisions").
pub fn migrate_anchored_insertions<E: Element>(
    anchored_moves: &[AnchoredMove<E>],
    base_files: &BTreeMap<Arc<str>, File<E>>,
    left_files: &BTreeMap<Arc<str>, File<E>>,
    right_files: &BTreeMap<Arc<str>, File<E>>,
    matches: &MatchesAndTheirSections<E>,
) -> Result<AnchorSpliceMap<E>> {
    let mut splices = HashMap::new();
    let mut consumed = HashSet::new();

    for mv in anchored_moves {
        let (dest_files, opp_files) = match mv.destination_side {
            Side::Left => (left_files, right_files),
            Side::Right => (right_files, left_files),
            Side::Base => continue,
        };

        let Some(base_file) = base_files.get(mv.source.path()) else { continue };
        let Some(base_index) = base_file.index_of(&mv.source) else { continue };

        let Some(dest_file) = dest_files.get(mv.anchor.path()) else { continue };
        let Some(dest_index) = dest_file.index_of(&mv.anchor) else { continue };

        // Prefer the opposite-side section the move's own `AllSides` match
        // already names (spec §4.6: one side relocated, the other held
        // still) over the positional fallback — it is exact rather than an
        // offset-alignment guess.
        let opp_path = mv.opposite.as_ref().map_or(mv.source.path(), Section::path);
        let Some(opp_file) = opp_files.get(opp_path) else { continue };
        let opp_anchor = match &mv.opposite {
            Some(known) => known,
            None => {
                let Some(found) = opp_file.section_at(mv.source.start()) else { continue };
                found
            }
        };
        let Some(opp_index) = opp_file.index_of(opp_anchor) else { continue };

        let (base_pred, base_succ) = neighbors(base_file, base_index, matches);
        let (dest_pred, dest_succ) = neighbors(dest_file, dest_index, matches);
        let (opp_pred, opp_succ) = neighbors(opp_file, opp_index, matches);

        for (direction, base_run, dest_run, opp_run) in [
            (Direction::Predecessor, base_pred, dest_pred, opp_pred),
            (Direction::Successor, base_succ, dest_succ, opp_succ),
        ] {
            if base_run.is_empty() && dest_run.is_empty() && opp_run.is_empty() {
                continue;
            }

            let (left_arg, right_arg) = match mv.destination_side {
                Side::Left => (&dest_run, &opp_run),
                _ => (&opp_run, &dest_run),
            };

            let outcome = merge_sequences(&base_run, left_arg, right_arg, section_content_equivalent, Section::size);

            match outcome.result {
                MergeResult::MergedWithConflicts(..) => {
                    let candidates = vec![format!("{dest_run:?}"), format!("{opp_run:?}")];
                    tracing::debug!(?candidates, anchor_size = mv.anchor.size(), "ambiguous anchored splice");
                    return Err(KineticMergeError::AmbiguousPropagation {
                        kind: "anchored splice",
                        destination_size: mv.anchor.size(),
                        candidates,
                    });
                }
                MergeResult::FullyMerged(merged) => {
                    let dest_content: Vec<&[E]> = dest_run.iter().map(Section::content).collect();
                    let merged_content: Vec<&[E]> = merged.iter().map(Section::content).collect();
                    if merged_content == dest_content {
                        continue;
                    }
                    for s in dest_run.iter().chain(opp_run.iter()) {
                        consumed.insert(s.clone());
                    }
                    splices.insert((mv.anchor.clone(), direction), merged);
                }
            }
        }
    }

    Ok(AnchorSpliceMap { splices, consumed })
}
