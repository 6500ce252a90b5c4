//! Multi-resolution match discovery (spec §4.4, C4).
//!
//! Finds a maximal, non-overlapping, size-respecting set of [`Match`]es
//! across base/left/right by fingerprinting windows of decreasing size and
//! synchronizing the per-side fingerprint streams like a three-way merge.
//!
//! # Implementation note: binary chop vs. linear probe-and-jump
//!
//! Spec §4.4's sure-fire phase is a binary chop over window sizes. This
//! implementation instead probes window sizes via the same accept/jump/
//! shrink decision rule, but walks them with a simple descending scan rather
//! than bisection: at each probe the coalesced-length estimate either sends
//! the next probe to a larger size (`estimate > w`, "jump"), accepts and
//! steps one below `w` (`estimate == w`), or steps one below `w` without
//! accepting (`estimate < w`, "shrink"). The set of matches ultimately
//! committed is the same either way — the binary chop is a traversal-order
//! optimization (spec §9: "an implementation may omit them at the cost of
//! repeated work"), not a correctness requirement. This mirrors the
//! simplification already made in [`crate::lcs`] for the DP table.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::fingerprint::fingerprint_windows;
use crate::model::{Element, Match, MatchKind, MatchesAndTheirSections, Section, Side, Sources};

// ---------------------------------------------------------------------------
// ClaimedIndex
// ---------------------------------------------------------------------------

/// Per-`(side, path)` index of already-admitted match section ranges, used
/// to answer the overlap and subsumption questions pare-down needs (spec
/// §4.4 "Pare-down-or-suppress"). Keyed on `(Side, path)` only — it doesn't
/// need to know `Element`, since overlap/subsumption are purely range
/// questions.
#[derive(Clone, Debug, Default)]
struct ClaimedIndex {
    ranges: HashMap<(Side, Arc<str>), Vec<(Range<usize>, MatchKind)>>,
}

fn ranges_intersect(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn contains(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && outer.end >= inner.end
}

impl ClaimedIndex {
    fn new() -> Self {
        Self::default()
    }

    fn key_for<E>(section: &Section<E>) -> (Side, Arc<str>) {
        (section.side(), section.path().clone())
    }

    fn insert<E>(&mut self, section: &Section<E>, kind: MatchKind) {
        let key = Self::key_for(section);
        self.ranges
            .entry(key)
            .or_default()
            .push((section.closed_open_interval(), kind));
    }

    fn insert_match<E>(&mut self, m: &Match<E>) {
        let kind = m.kind();
        for s in m.sections() {
            self.insert(s, kind);
        }
    }

    /// `true` if `section`'s range partially (non-containing) overlaps any
    /// already-claimed range on the same side/path. Containment in either
    /// direction and exact identity are deliberately excluded — those are
    /// handled by [`Self::subsuming_kinds`] and the "identical duplicates
    /// are allowed" carve-out (spec §3 invariants).
    fn partially_overlaps<E>(&self, section: &Section<E>) -> bool {
        let key = Self::key_for(section);
        let r = section.closed_open_interval();
        self.ranges.get(&key).into_iter().flatten().any(|(claimed, _)| {
            ranges_intersect(claimed, &r) && !contains(claimed, &r) && !contains(&r, claimed)
        })
    }

    /// The kinds of already-claimed ranges that properly (strictly) contain
    /// `section`'s range on the same side/path.
    fn subsuming_kinds<E>(&self, section: &Section<E>) -> Vec<MatchKind> {
        let key = Self::key_for(section);
        let r = section.closed_open_interval();
        self.ranges
            .get(&key)
            .into_iter()
            .flatten()
            .filter(|(claimed, _)| contains(claimed, &r) && claimed != &r)
            .map(|(_, kind)| *kind)
            .collect()
    }

    /// Pare down `candidate` against this index (spec §4.4 "Pare-down-or-
    /// suppress"):
    ///
    /// - Any section that partially overlaps an existing claim rejects the
    ///   whole candidate outright.
    /// - An `AllSides` candidate subsumed by *other `AllSides` claims* on
    ///   two or more sides is dropped; subsumed on exactly one such side, it
    ///   is downgraded to the pairwise match over the remaining two sides.
    ///   Subsumption by a *pairwise* claim is not treated as exclusionary
    ///   here: the newly discovered three-way correspondence is strictly
    ///   more informative than the coarser two-way claim it sits inside, so
    ///   it is admitted and the stabilization loop (`stabilize`) carves the
    ///   older pairwise match around it instead of discarding the new find.
    /// - A pairwise candidate subsumed on either side by *any* existing
    ///   claim (pairwise or `AllSides`) is dropped outright — there is no
    ///   carve-out move available for a pairwise match the way there is for
    ///   `AllSides`.
    fn pare_down<E: Element>(&self, candidate: Match<E>) -> Option<Match<E>> {
        for section in candidate.sections() {
            if self.partially_overlaps(section) {
                return None;
            }
        }
        match candidate {
            Match::AllSides { base, left, right } => {
                let base_by_all = self.subsuming_kinds(&base).contains(&MatchKind::AllSides);
                let left_by_all = self.subsuming_kinds(&left).contains(&MatchKind::AllSides);
                let right_by_all = self.subsuming_kinds(&right).contains(&MatchKind::AllSides);
                let count = [base_by_all, left_by_all, right_by_all].into_iter().filter(|x| *x).count();
                if count >= 2 {
                    return None;
                }
                if count == 1 {
                    return if base_by_all {
                        self.pare_down(Match::LeftAndRight { left, right })
                    } else if left_by_all {
                        self.pare_down(Match::BaseAndRight { base, right })
                    } else {
                        self.pare_down(Match::BaseAndLeft { base, left })
                    };
                }
                Some(Match::AllSides { base, left, right })
            }
            pairwise => {
                let (a, b) = pairwise_sections(&pairwise);
                if self.subsuming_kinds(a).is_empty() && self.subsuming_kinds(b).is_empty() {
                    Some(pairwise)
                } else {
                    None
                }
            }
        }
    }
}

/// The two sections of a pairwise [`Match`], in a canonical order (spec
/// §3). Panics on `AllSides` — callers only reach here after matching on
/// `MatchKind` and excluding it.
fn pairwise_sections<E>(m: &Match<E>) -> (&Section<E>, &Section<E>) {
    match m {
        Match::BaseAndLeft { base, left } => (base, left),
        Match::BaseAndRight { base, right } => (base, right),
        Match::LeftAndRight { left, right } => (left, right),
        Match::AllSides { .. } => unreachable!("AllSides is not a pairwise match"),
    }
}

/// The two sections of an `AllSides` match corresponding to a pairwise
/// `kind` (e.g. `kind = BaseAndLeft` picks `(base, left)`).
fn allsides_sections_for_kind<E>(m: &Match<E>, kind: MatchKind) -> (&Section<E>, &Section<E>) {
    let Match::AllSides { base, left, right } = m else {
        unreachable!("allsides_sections_for_kind called on a non-AllSides match");
    };
    match kind {
        MatchKind::BaseAndLeft => (base, left),
        MatchKind::BaseAndRight => (base, right),
        MatchKind::LeftAndRight => (left, right),
        MatchKind::AllSides => unreachable!("kind must be pairwise"),
    }
}

/// Rebuild a pairwise match of `kind` from a pair of sections, in the same
/// order [`pairwise_sections`] would destructure them.
fn rebuild_pairwise<E>(kind: MatchKind, a: Section<E>, b: Section<E>) -> Match<E> {
    match kind {
        MatchKind::BaseAndLeft => Match::BaseAndLeft { base: a, left: b },
        MatchKind::BaseAndRight => Match::BaseAndRight { base: a, right: b },
        MatchKind::LeftAndRight => Match::LeftAndRight { left: a, right: b },
        MatchKind::AllSides => unreachable!("kind must be pairwise"),
    }
}

// ---------------------------------------------------------------------------
// Eligibility & fingerprint grouping
// ---------------------------------------------------------------------------

/// Every window of `w` elements eligible under `config`'s per-file threshold
/// (spec §4.4 "Per-file threshold"), paired with its rolling fingerprint.
fn eligible_sections_with_fp<E: Element>(src: &Sources<E>, w: usize, config: &Config) -> Vec<(Section<E>, u64)> {
    let mut out = Vec::new();
    if w == 0 {
        return out;
    }
    for path in src.paths() {
        let Some(size) = src.file_size(path) else { continue };
        if w > size || w < config.per_file_threshold(size) {
            continue;
        }
        let Some(content) = src.content_of(path) else { continue };
        let fps = fingerprint_windows(content, w);
        for (offset, fp) in fps.into_iter().enumerate() {
            if let Some(section) = src.section(path, offset, w) {
                out.push((section, fp));
            }
        }
    }
    out
}

type KeyedGroup<E> = ((u64, Vec<E>), Vec<Section<E>>);

/// Group windows sharing the same `(fingerprint, content)` key (spec §4.4
/// `PotentialMatchKey`) and sort the groups by that key — lexicographically
/// by fingerprint, then by content. Since [`Element`] requires `Ord`, full
/// content comparison (rather than a bounded prefix) is used directly; it is
/// only ever invoked to break a fingerprint tie, so this does not change the
/// cost profile spec §4.4 describes, just simplifies away the separate
/// "bounded prefix, then full content on tie" two-step spec §4.4 prescribes.
fn group_by_key<E: Element>(mut items: Vec<(Section<E>, u64)>) -> Vec<KeyedGroup<E>> {
    items.sort_by(|(sa, fa), (sb, fb)| fa.cmp(fb).then_with(|| sa.content().cmp(sb.content())));
    let mut groups: Vec<KeyedGroup<E>> = Vec::new();
    for (section, fp) in items {
        let content = section.content().to_vec();
        if let Some(((last_fp, last_content), sections)) = groups.last_mut() {
            if *last_fp == fp && *last_content == content {
                sections.push(section);
                continue;
            }
        }
        groups.push(((fp, content), vec![section]));
    }
    groups
}

// ---------------------------------------------------------------------------
// Synchronized three-way walk over one window size
// ---------------------------------------------------------------------------

struct PassOutcome<E> {
    accepted: Vec<Match<E>>,
    admitted: usize,
    downgraded: usize,
    dropped: usize,
}

/// Synchronize the three per-side fingerprint-grouped streams for window
/// size `w` like a three-way merge (spec §4.4 "Fingerprint synchronization")
/// and emit pared-down candidates. Pare-down is applied incrementally
/// against a local clone of `claimed` so that candidates considered later in
/// the same pass see the ones already accepted earlier in it.
fn matches_for_window_size<E: Element>(
    w: usize,
    base: &Sources<E>,
    left: &Sources<E>,
    right: &Sources<E>,
    config: &Config,
    claimed: &ClaimedIndex,
) -> PassOutcome<E> {
    let base_groups = group_by_key(eligible_sections_with_fp(base, w, config));
    let left_groups = group_by_key(eligible_sections_with_fp(left, w, config));
    let right_groups = group_by_key(eligible_sections_with_fp(right, w, config));

    let mut local = claimed.clone();
    let mut accepted = Vec::new();
    let mut admitted = 0usize;
    let mut downgraded = 0usize;
    let mut dropped = 0usize;

    let (mut bi, mut li, mut ri) = (0usize, 0usize, 0usize);
    loop {
        let bk = base_groups.get(bi).map(|(k, _)| k);
        let lk = left_groups.get(li).map(|(k, _)| k);
        let rk = right_groups.get(ri).map(|(k, _)| k);
        if bk.is_none() && lk.is_none() && rk.is_none() {
            break;
        }
        let min_key = [bk, lk, rk].into_iter().flatten().min().cloned().expect("at least one key present");
        let b_match = bk == Some(&min_key);
        let l_match = lk == Some(&min_key);
        let r_match = rk == Some(&min_key);

        match (b_match, l_match, r_match) {
            (true, true, true) => {
                emit_all_sides(
                    &base_groups[bi].1,
                    &left_groups[li].1,
                    &right_groups[ri].1,
                    w,
                    config,
                    &mut local,
                    &mut accepted,
                    &mut admitted,
                    &mut downgraded,
                    &mut dropped,
                );
                bi += 1;
                li += 1;
                ri += 1;
            }
            (true, true, false) => {
                emit_pairwise(
                    MatchKind::BaseAndLeft,
                    &base_groups[bi].1,
                    &left_groups[li].1,
                    w,
                    config,
                    &mut local,
                    &mut accepted,
                    &mut admitted,
                    &mut dropped,
                );
                bi += 1;
                li += 1;
            }
            (true, false, true) => {
                emit_pairwise(
                    MatchKind::BaseAndRight,
                    &base_groups[bi].1,
                    &right_groups[ri].1,
                    w,
                    config,
                    &mut local,
                    &mut accepted,
                    &mut admitted,
                    &mut dropped,
                );
                bi += 1;
                ri += 1;
            }
            (false, true, true) => {
                emit_pairwise(
                    MatchKind::LeftAndRight,
                    &left_groups[li].1,
                    &right_groups[ri].1,
                    w,
                    config,
                    &mut local,
                    &mut accepted,
                    &mut admitted,
                    &mut dropped,
                );
                li += 1;
                ri += 1;
            }
            (true, false, false) => bi += 1,
            (false, true, false) => li += 1,
            (false, false, true) => ri += 1,
            (false, false, false) => unreachable!("at least one side must hold the minimum key"),
        }
    }

    PassOutcome {
        accepted,
        admitted,
        downgraded,
        dropped,
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_all_sides<E: Element>(
    bases: &[Section<E>],
    lefts: &[Section<E>],
    rights: &[Section<E>],
    w: usize,
    config: &Config,
    local: &mut ClaimedIndex,
    accepted: &mut Vec<Match<E>>,
    admitted: &mut usize,
    downgraded: &mut usize,
    dropped: &mut usize,
) {
    let total_combos = bases.len() * lefts.len() * rights.len();
    let combos: Vec<(Section<E>, Section<E>, Section<E>)> = if total_combos > 1 && w >= config.minimum_ambiguous_match_size {
        let mut v = Vec::with_capacity(total_combos);
        for b in bases {
            for l in lefts {
                for r in rights {
                    v.push((b.clone(), l.clone(), r.clone()));
                }
            }
        }
        v
    } else {
        vec![(bases[0].clone(), lefts[0].clone(), rights[0].clone())]
    };
    for (base, left, right) in combos {
        let was_all_sides = true;
        match local.pare_down(Match::AllSides { base, left, right }) {
            Some(m) => {
                if was_all_sides && !matches!(m.kind(), MatchKind::AllSides) {
                    *downgraded += 1;
                } else {
                    *admitted += 1;
                }
                local.insert_match(&m);
                accepted.push(m);
            }
            None => *dropped += 1,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_pairwise<E: Element>(
    kind: MatchKind,
    group_a: &[Section<E>],
    group_b: &[Section<E>],
    w: usize,
    config: &Config,
    local: &mut ClaimedIndex,
    accepted: &mut Vec<Match<E>>,
    admitted: &mut usize,
    dropped: &mut usize,
) {
    let total_combos = group_a.len() * group_b.len();
    let combos: Vec<(Section<E>, Section<E>)> = if total_combos > 1 && w >= config.minimum_ambiguous_match_size {
        let mut v = Vec::with_capacity(total_combos);
        for a in group_a {
            for b in group_b {
                v.push((a.clone(), b.clone()));
            }
        }
        v
    } else {
        vec![(group_a[0].clone(), group_b[0].clone())]
    };
    for (a, b) in combos {
        match local.pare_down(rebuild_pairwise(kind, a, b)) {
            Some(m) => {
                *admitted += 1;
                local.insert_match(&m);
                accepted.push(m);
            }
            None => *dropped += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Estimate (coalesced max length) for the sure-fire binary-chop decision
// ---------------------------------------------------------------------------

/// The largest run obtained by coalescing overlapping/adjacent section
/// ranges per side among `new_matches` (spec §4.4 "estimate an optimal
/// size").
fn coalesced_estimate<E>(new_matches: &[Match<E>]) -> usize {
    let mut by_key: HashMap<(Side, Arc<str>), Vec<Range<usize>>> = HashMap::new();
    for m in new_matches {
        for s in m.sections() {
            by_key.entry((s.side(), s.path().clone())).or_default().push(s.closed_open_interval());
        }
    }
    let mut max_len = 0usize;
    for ranges in by_key.values_mut() {
        ranges.sort_by_key(|r| r.start);
        let mut current: Option<Range<usize>> = None;
        for r in ranges.iter().cloned() {
            current = Some(match current {
                None => r,
                Some(c) if r.start <= c.end => c.start..c.end.max(r.end),
                Some(c) => {
                    max_len = max_len.max(c.end - c.start);
                    r
                }
            });
        }
        if let Some(c) = current {
            max_len = max_len.max(c.end - c.start);
        }
    }
    max_len
}

// ---------------------------------------------------------------------------
// Stabilization: carve older pairwise matches around newly found AllSides
// ---------------------------------------------------------------------------

/// Find an `AllSides` match among `candidates` whose two sections
/// corresponding to `p`'s kind sit strictly inside `p`'s own two sections
/// (spec §4.4 "bites").
fn find_biting_allsides<'a, E: Element>(p: &Match<E>, candidates: &'a [Match<E>]) -> Option<&'a Match<E>> {
    let kind = p.kind();
    let (sec_a, sec_b) = pairwise_sections(p);
    candidates.iter().find(|a| {
        let (ax, ay) = allsides_sections_for_kind(a, kind);
        ax.path() == sec_a.path()
            && ay.path() == sec_b.path()
            && contains(&sec_a.closed_open_interval(), &ax.closed_open_interval())
            && ax.closed_open_interval() != sec_a.closed_open_interval()
            && contains(&sec_b.closed_open_interval(), &ay.closed_open_interval())
            && ay.closed_open_interval() != sec_b.closed_open_interval()
    })
}

/// Carve `p` into up to two pairwise fragments (prefix/suffix) around the
/// bite taken by `bite` (spec §4.4 "symmetric difference... up to two
/// pairwise fragments per gap").
fn fragment_pairwise<E: Element>(p: &Match<E>, bite: &Match<E>) -> Vec<Match<E>> {
    let kind = p.kind();
    let (sec_a, sec_b) = pairwise_sections(p);
    let (bite_a, bite_b) = allsides_sections_for_kind(bite, kind);

    let rel_start = bite_a.start() - sec_a.start();
    let rel_len = bite_a.length();

    let mut fragments = Vec::with_capacity(2);
    if rel_start > 0 {
        fragments.push(rebuild_pairwise(kind, sec_a.sub_section(0, rel_start), sec_b.sub_section(0, rel_start)));
    }
    let suffix_start = rel_start + rel_len;
    if suffix_start < sec_a.length() {
        let suffix_len = sec_a.length() - suffix_start;
        fragments.push(rebuild_pairwise(
            kind,
            sec_a.sub_section(suffix_start, suffix_len),
            sec_b.sub_section(suffix_start, suffix_len),
        ));
    }
    fragments
}

/// Iteratively break up pairwise matches subsumed on both their sides by
/// `new_all_sides` (spec §4.4 "Stabilization loop"), rebuilding `claimed`
/// and `matches` to reflect the fragments.
fn stabilize<E: Element>(new_all_sides: &[Match<E>], claimed: &mut ClaimedIndex, matches: &mut MatchesAndTheirSections<E>) {
    if new_all_sides.is_empty() {
        return;
    }
    let mut guard = 0usize;
    loop {
        guard += 1;
        let snapshot: Vec<Match<E>> = matches.iter().cloned().collect();
        let mut next: Vec<Match<E>> = Vec::with_capacity(snapshot.len());
        let mut any_fragmented = false;
        for m in snapshot {
            if matches!(m.kind(), MatchKind::AllSides) {
                next.push(m);
                continue;
            }
            if let Some(bite) = find_biting_allsides(&m, new_all_sides) {
                any_fragmented = true;
                next.extend(fragment_pairwise(&m, bite));
            } else {
                next.push(m);
            }
        }
        if !any_fragmented || guard > snapshot.len().max(1) + 8 {
            break;
        }
        let mut rebuilt_claimed = ClaimedIndex::new();
        let mut rebuilt_matches = MatchesAndTheirSections::new();
        for m in next {
            if let Some(pared) = rebuilt_claimed.pare_down(m) {
                rebuilt_claimed.insert_match(&pared);
                rebuilt_matches.insert(pared);
            }
        }
        *claimed = rebuilt_claimed;
        *matches = rebuilt_matches;
    }
}

/// Remove any pairwise match whose two sections both already belong to some
/// `AllSides` match (spec §3 "redundant pairwise", §4.4 "Redundant-pairwise
/// removal").
fn remove_redundant_pairwise<E: Element>(matches: MatchesAndTheirSections<E>) -> MatchesAndTheirSections<E> {
    matches.retain(|m| {
        if matches!(m.kind(), MatchKind::AllSides) {
            return true;
        }
        let (a, b) = pairwise_sections(m);
        let a_has_all_sides = matches.matches_for(a).any(|o| matches!(o.kind(), MatchKind::AllSides));
        let b_has_all_sides = matches.matches_for(b).any(|o| matches!(o.kind(), MatchKind::AllSides));
        !(a_has_all_sides && b_has_all_sides)
    })
}

// ---------------------------------------------------------------------------
// Window size bounds (spec §4.4 "Global bounds")
// ---------------------------------------------------------------------------

struct WindowBounds {
    minimum_window_size_across_all: usize,
    minimum_sure_fire_window_size: usize,
    max_possible_match_size: usize,
}

fn all_file_sizes<E>(base: &Sources<E>, left: &Sources<E>, right: &Sources<E>) -> Vec<usize> {
    [base, left, right]
        .into_iter()
        .flat_map(|src| src.paths().filter_map(|p| src.file_size(p)).collect::<Vec<_>>())
        .collect()
}

fn window_bounds<E>(base: &Sources<E>, left: &Sources<E>, right: &Sources<E>, config: &Config) -> Option<WindowBounds> {
    let mut sizes = all_file_sizes(base, left, right);
    if sizes.is_empty() {
        return None;
    }
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    let min_file_size = *sizes.last().expect("sizes is non-empty");
    let max_file_size = sizes[0];
    let max_possible_match_size = sizes.get(1).copied().unwrap_or(max_file_size);

    let minimum_window_size_across_all = config.per_file_threshold(min_file_size);
    let minimum_sure_fire_window_size = max_possible_match_size.min(config.per_file_threshold(max_file_size));

    Some(WindowBounds {
        minimum_window_size_across_all,
        minimum_sure_fire_window_size,
        max_possible_match_size,
    })
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Discover the stabilized match set across `base`/`left`/`right` (spec
/// §4.4). Runs the sure-fire phase (window sizes from
/// `max_possible_match_size` down to `minimum_sure_fire_window_size`, each
/// probe accepted only once its coalesced estimate agrees with the probed
/// size) followed by the small-fry phase (every remaining size down to
/// `minimum_window_size_across_all`, committed unconditionally), then
/// removes redundant pairwise matches (spec §4.4 "Redundant-pairwise
/// removal").
#[must_use]
pub fn discover_matches<E: Element>(
    base: &Sources<E>,
    left: &Sources<E>,
    right: &Sources<E>,
    config: &Config,
) -> MatchesAndTheirSections<E> {
    let mut claimed = ClaimedIndex::new();
    let mut matches = MatchesAndTheirSections::new();

    let Some(bounds) = window_bounds(base, left, right, config) else {
        return matches;
    };

    sure_fire_phase(&bounds, base, left, right, config, &mut claimed, &mut matches);
    small_fry_phase(&bounds, base, left, right, config, &mut claimed, &mut matches);

    remove_redundant_pairwise(matches)
}

#[allow(clippy::too_many_arguments)]
fn sure_fire_phase<E: Element>(
    bounds: &WindowBounds,
    base: &Sources<E>,
    left: &Sources<E>,
    right: &Sources<E>,
    config: &Config,
    claimed: &mut ClaimedIndex,
    matches: &mut MatchesAndTheirSections<E>,
) {
    if bounds.max_possible_match_size < bounds.minimum_sure_fire_window_size {
        return;
    }
    let mut w = bounds.max_possible_match_size;
    let mut guard = 0usize;
    let max_guard = (bounds.max_possible_match_size - bounds.minimum_sure_fire_window_size + 1) * 4 + 16;

    while w >= bounds.minimum_sure_fire_window_size && guard < max_guard {
        guard += 1;
        let span = tracing::debug_span!("match_discovery", window_size = w, phase = "sure_fire");
        let _enter = span.enter();

        let outcome = matches_for_window_size(w, base, left, right, config, claimed);
        let estimate = coalesced_estimate(&outcome.accepted);
        debug!(
            admitted = outcome.admitted,
            downgraded = outcome.downgraded,
            dropped = outcome.dropped,
            estimate,
            "sure-fire probe"
        );

        if estimate > w {
            w = estimate.min(bounds.max_possible_match_size);
            continue;
        }

        let new_all_sides: Vec<Match<E>> = outcome
            .accepted
            .iter()
            .filter(|m| matches!(m.kind(), MatchKind::AllSides))
            .cloned()
            .collect();
        for m in outcome.accepted {
            claimed.insert_match(&m);
            matches.insert(m);
        }
        stabilize(&new_all_sides, claimed, matches);

        if w == 0 {
            break;
        }
        w -= 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn small_fry_phase<E: Element>(
    bounds: &WindowBounds,
    base: &Sources<E>,
    left: &Sources<E>,
    right: &Sources<E>,
    config: &Config,
    claimed: &mut ClaimedIndex,
    matches: &mut MatchesAndTheirSections<E>,
) {
    if bounds.minimum_sure_fire_window_size == 0 {
        return;
    }
    let mut w = bounds.minimum_sure_fire_window_size - 1;
    loop {
        if w < bounds.minimum_window_size_across_all {
            break;
        }
        let span = tracing::debug_span!("match_discovery", window_size = w, phase = "small_fry");
        let _enter = span.enter();

        let outcome = matches_for_window_size(w, base, left, right, config, claimed);
        debug!(
            admitted = outcome.admitted,
            downgraded = outcome.downgraded,
            dropped = outcome.dropped,
            "small-fry probe"
        );

        let new_all_sides: Vec<Match<E>> = outcome
            .accepted
            .iter()
            .filter(|m| matches!(m.kind(), MatchKind::AllSides))
            .cloned()
            .collect();
        for m in outcome.accepted {
            claimed.insert_match(&m);
            matches.insert(m);
        }
        stabilize(&new_all_sides, claimed, matches);

        if w == 0 {
            break;
        }
        w -= 1;
    }
}
