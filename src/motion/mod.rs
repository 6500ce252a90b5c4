//! Motion evaluator (spec §4.6, C6).
//!
//! Turns the stabilized match set from [`crate::discovery`] plus the
//! speculative per-origin migrations a per-path merge
//! ([`crate::merge_algebra::merge_sequences`]) produced into a
//! [`MoveDestinationsReport`], the set of substitutions each non-divergent
//! move should propagate to its destinations, and the anchors C7 will use to
//! find content that should ride along with a move.
//!
//! # Implementation note: one source per move
//!
//! Spec §3 defines a move's [`DominantsKey`] as the set of dominant sections
//! shared by every match in the group, allowing a move to have multiple
//! sources when separately-discovered matches turn out to describe the same
//! relocated content. This implementation keys every move on a single base
//! section's dominant — the kind-consistency invariant discovery maintains
//! (spec §3: every match touching a given section agrees on its kind) means
//! a base section is claimed by at most one match family, so aggregating
//! across *different* base sections that happen to describe the same
//! migrated content is the only case this simplification doesn't cover. That
//! aggregation is a genuine Open Question left unresolved by spec §4.6; this
//! crate does not attempt it, and every move reported here has exactly one
//! source.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::{KineticMergeError, Result};
use crate::model::{ContentMigration, DominantsKey, Element, Match, MatchesAndTheirSections, MoveDestinationsReport, Section, Side, Sources};

/// `true` if `s` sits somewhere other than `base`'s own `(path, start)`.
fn relocated<E>(s: &Section<E>, base: &Section<E>) -> bool {
    (s.path(), s.start()) != (base.path(), base.start())
}

/// One anchored-move candidate (spec §4.6, §4.7 input): a single section
/// relocated from `source` to `anchor` on `destination_side`, with no
/// divergence on the opposite side.
#[derive(Clone, Debug)]
pub struct AnchoredMove<E> {
    /// The base section the content moved away from.
    pub source: Section<E>,
    /// The section the content landed at.
    pub anchor: Section<E>,
    /// Which side `anchor` lives on.
    pub destination_side: Side,
    /// The section that stayed behind at the origin's own location on the
    /// side opposite `destination_side`, when the move's match directly
    /// names one (an `AllSides` match where only one side relocated). `None`
    /// for a pairwise move, where no such section exists and C7 must locate
    /// the opposite side's neighborhood positionally instead.
    pub opposite: Option<Section<E>>,
}

/// The full output of [`evaluate_moves`] (spec §4.6).
#[derive(Clone, Debug, Default)]
pub struct EvaluatedMoves<E> {
    /// Every move discovered, grouped by dominants key.
    pub move_destinations_report: MoveDestinationsReport<E>,
    /// Origin sections whose migration was consumed as a substitution —
    /// C7/C8 must not apply it again when walking the base-side merge
    /// result directly.
    pub migrated_edit_suppressions: HashSet<Section<E>>,
    /// For each non-coincident destination of a non-divergent move with a
    /// resolved migration, the content (or deletion) it should receive.
    pub substitutions_by_destination: HashMap<Section<E>, ContentMigration<Section<E>>>,
    /// Single-destination, single-source moves eligible for anchored
    /// insertion migration (spec §4.7).
    pub anchored_moves: Vec<AnchoredMove<E>>,
}

/// The [`MoveDestinationsReport`] implied by `matches`, with no substitution
/// or anchored-migration evaluation attached — a read-only "what moved
/// where" view for callers that only ran discovery (spec §6
/// `CodeMotionAnalysis`, which exposes this without requiring a full
/// [`evaluate_moves`] pass).
#[must_use]
pub fn move_destinations_report<E: Element>(matches: &MatchesAndTheirSections<E>) -> MoveDestinationsReport<E> {
    build_move_report(matches).0
}

/// Build the [`MoveDestinationsReport`] implied by `matches` (spec §3,
/// §4.6). A match with no base section ([`Match::LeftAndRight`]) describes a
/// coincident insertion, not a move, and contributes nothing here.
fn build_move_report<E: Element>(
    matches: &MatchesAndTheirSections<E>,
) -> (MoveDestinationsReport<E>, HashMap<Section<E>, Section<E>>) {
    let mut report = MoveDestinationsReport::new();
    let mut opposite_anchors: HashMap<Section<E>, Section<E>> = HashMap::new();
    for m in matches.iter() {
        let Some(base) = m.base() else { continue };
        let key = DominantsKey::new(vec![base.clone()]);
        let entry = report.entry(key);
        if entry.sources.is_empty() {
            entry.sources.push(base.clone());
        }
        match m {
            Match::AllSides { left, right, .. } => {
                let left_moved = relocated(left, base);
                let right_moved = relocated(right, base);
                match (left_moved, right_moved) {
                    (true, true) => {
                        if left.path() == right.path() && left.start() == right.start() && left.length() == right.length() {
                            entry.coincident.push(left.clone());
                        } else {
                            entry.left.push(left.clone());
                            entry.right.push(right.clone());
                        }
                    }
                    (true, false) => {
                        entry.left.push(left.clone());
                        opposite_anchors.insert(base.clone(), right.clone());
                    }
                    (false, true) => {
                        entry.right.push(right.clone());
                        opposite_anchors.insert(base.clone(), left.clone());
                    }
                    (false, false) => {}
                }
            }
            Match::BaseAndLeft { left, .. } => {
                if relocated(left, base) {
                    entry.left.push(left.clone());
                }
            }
            Match::BaseAndRight { right, .. } => {
                if relocated(right, base) {
                    entry.right.push(right.clone());
                }
            }
            Match::LeftAndRight { .. } => unreachable!("filtered out by the `base()` guard above"),
        }
    }
    (report, opposite_anchors)
}

/// What the side not named by a pairwise `(base, S)` match did to `base`'s
/// content, read directly off that side's raw content rather than through
/// the per-path merge algebra (spec §4.6 input).
///
/// A `BaseAndLeft`/`BaseAndRight` match only constrains the side it names;
/// the free side is unconstrained and may have edited, deleted, or simply
/// kept the same content base had. This assumes the free side didn't shift
/// that stretch via an independent insertion/deletion of a different length
/// earlier in the same file — the offset comparison is exact only when the
/// free side's edit, if any, preserved length and position.
fn infer_free_side_migration<E: Element>(base: &Section<E>, free_side: &Sources<E>) -> ContentMigration<Section<E>> {
    let Some(content) = free_side.content_of(base.path()) else {
        return ContentMigration::Deletion;
    };
    let start = base.start();
    let end = start + base.length();
    if end > content.len() {
        return ContentMigration::Deletion;
    }
    if content[start..end] == *base.content() {
        return ContentMigration::PlainMove;
    }
    if start == end {
        return ContentMigration::Deletion;
    }
    match free_side.section(base.path(), start, base.length()) {
        Some(section) => ContentMigration::Edit(vec![section]),
        None => ContentMigration::Deletion,
    }
}

/// Derive per-origin migrations directly from `matches`, bypassing the
/// per-path merge algebra entirely (spec §4.6 input, an alternative source
/// to [`crate::merge_algebra::MergeOutcome::migrations`]).
///
/// # Implementation note: why not trust the per-path merge's own migrations
///
/// [`crate::merge_algebra::merge_sequences`] records a migration only when
/// exactly one side's run differs from `base`'s run at a hunk; a move source
/// whose *other* side also edited the same position independently (spec §8
/// "move with propagated edit") instead produces a hunk where the moved-away
/// side's run is empty and the free side's run differs from base in both
/// length and content from the moved side's perspective — which the generic,
/// match-unaware hunk comparison reports as a conflict, recording no
/// migration at all. This function instead looks directly at the free
/// side's content at the origin's own position, which is exactly the
/// comparison spec §4.6 needs and does not depend on the per-path algebra
/// correctly guessing that a relocation, not a deletion, explains the moved
/// side's empty run.
#[must_use]
pub fn derive_migrations<E: Element>(
    matches: &MatchesAndTheirSections<E>,
    left: &Sources<E>,
    right: &Sources<E>,
) -> HashMap<Section<E>, ContentMigration<Section<E>>> {
    let mut out = HashMap::new();
    for m in matches.iter() {
        match m {
            Match::BaseAndLeft { base, left: left_sec } => {
                if relocated(left_sec, base) {
                    out.insert(base.clone(), infer_free_side_migration(base, right));
                }
            }
            Match::BaseAndRight { base, right: right_sec } => {
                if relocated(right_sec, base) {
                    out.insert(base.clone(), infer_free_side_migration(base, left));
                }
            }
            Match::AllSides { .. } | Match::LeftAndRight { .. } => {}
        }
    }
    out
}

/// Evaluate `matches` and `migrations` into an [`EvaluatedMoves`] (spec
/// §4.6).
///
/// `migrations` maps an origin base section (as it appeared in some path's
/// merge) to the fate its content was given on the one side that changed it;
/// entries come from [`crate::merge_algebra::MergeOutcome::migrations`]
/// across every path's merge, keyed by section rather than raw element so
/// that distinct origins with identical content don't collide.
///
/// # Errors
///
/// Returns [`KineticMergeError::AmbiguousPropagation`] if a single move's
/// destinations would receive two distinct, non-equal migrations — which
/// cannot happen under the single-source simplification this module makes,
/// but the check is kept in case a future multi-source aggregation
/// reintroduces the possibility.
pub fn evaluate_moves<E: Element>(
    matches: &MatchesAndTheirSections<E>,
    migrations: &HashMap<Section<E>, ContentMigration<Section<E>>>,
) -> Result<EvaluatedMoves<E>> {
    let (report, opposite_anchors) = build_move_report(matches);
    let mut substitutions = HashMap::new();
    let mut suppressions = HashSet::new();
    let mut anchored_moves = Vec::new();

    for (_key, dest) in report.iter() {
        if dest.is_divergent() {
            // Divergent moves are inert: neither side's edit has a single
            // destination to land on (spec §4.6 "divergent moves propagate
            // neither substitutions nor anchored insertions").
            continue;
        }
        if dest.is_degenerate() {
            continue;
        }

        let mut distinct: Vec<&ContentMigration<Section<E>>> = Vec::new();
        for src in &dest.sources {
            if let Some(migration) = migrations.get(src) {
                if !matches!(migration, ContentMigration::PlainMove) && !distinct.contains(&migration) {
                    distinct.push(migration);
                }
            }
        }

        if distinct.is_empty() {
            continue;
        }
        if distinct.len() > 1 {
            let candidates: Vec<String> = distinct.iter().map(|c| format!("{c:?}")).collect();
            tracing::debug!(?candidates, destination_size = dest.sources.iter().map(Section::size).sum::<usize>(), "ambiguous propagation");
            return Err(KineticMergeError::AmbiguousPropagation {
                kind: "substitution",
                destination_size: dest.sources.iter().map(Section::size).sum(),
                candidates,
            });
        }
        let migration = distinct[0].clone();

        // Coincident destinations receive no propagated edit (spec §4.6).
        for d in dest.left.iter().chain(dest.right.iter()) {
            substitutions.insert(d.clone(), migration.clone());
        }
        for src in &dest.sources {
            suppressions.insert(src.clone());
        }

        if dest.sources.len() == 1 {
            let source = dest.sources[0].clone();
            let opposite = opposite_anchors.get(&source).cloned();
            if let [anchor] = dest.left.as_slice() {
                anchored_moves.push(AnchoredMove {
                    source: source.clone(),
                    anchor: anchor.clone(),
                    destination_side: Side::Left,
                    opposite: opposite.clone(),
                });
            }
            if let [anchor] = dest.right.as_slice() {
                anchored_moves.push(AnchoredMove {
                    source,
                    anchor: anchor.clone(),
                    destination_side: Side::Right,
                    opposite,
                });
            }
        }
    }

    Ok(EvaluatedMoves {
        move_destinations_report: report,
        migrated_edit_suppressions: suppressions,
        substitutions_by_destination: substitutions,
        anchored_moves,
    })
}
