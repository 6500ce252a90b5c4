//! Structural invariants of match discovery, checked against randomly
//! generated trees (spec §8 "Round-trip / structural invariants").
//!
//! Gated behind the `proptests` feature so the (slower) randomized suite
//! opts in rather than running on every `cargo test`.
//!
//! # Coverage
//!
//! - Reconstruction: concatenating a file's sections reproduces its input.
//! - Sectioning utilisation: `files_by_path_utilising` partitions each file
//!   and keeps every mandatory section intact.
//! - Match kind consistency: every section's matches share one variant.
//! - No redundant pairwise: a pairwise match's sections never both also
//!   belong to some `AllSides` match.
//! - No double-side subsumption: an `AllSides` match is never subsumed on
//!   two or more sides by the final match set.

#![cfg(all(test, feature = "proptests"))]

use std::collections::BTreeSet;

use kinetic_merge::discovery::discover_matches;
use kinetic_merge::model::{Match, MatchKind};
use kinetic_merge::{Config, Side, Sources};
use proptest::prelude::*;

/// Three same-length-ish token vectors sharing a common vocabulary, so
/// discovery actually has matches to find rather than three disjoint trees.
fn arb_trees() -> impl Strategy<Value = (Vec<u32>, Vec<u32>, Vec<u32>)> {
    let vocab = prop::collection::vec(0u32..12, 3..20);
    vocab.prop_flat_map(|base| {
        let base_for_left = base.clone();
        let base_for_right = base.clone();
        (
            Just(base),
            prop::sample::subsequence((0..base_for_left.len()).collect::<Vec<_>>(), 0..=base_for_left.len())
                .prop_map(move |idxs| idxs.into_iter().map(|i| base_for_left[i]).collect::<Vec<_>>()),
            prop::sample::subsequence((0..base_for_right.len()).collect::<Vec<_>>(), 0..=base_for_right.len())
                .prop_map(move |idxs| idxs.into_iter().map(|i| base_for_right[i]).collect::<Vec<_>>()),
        )
    })
}

fn config() -> Config {
    Config::new(1, 0.0, usize::MAX).expect("valid config")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Reconstruction (spec §8): concatenating a file's sections in order
    /// reproduces the side's original content.
    #[test]
    fn reconstruction_round_trips((base_v, left_v, right_v) in arb_trees()) {
        let base = Sources::new(Side::Base, [("a.rs", base_v.clone())]);
        let left = Sources::new(Side::Left, [("a.rs", left_v.clone())]);
        let right = Sources::new(Side::Right, [("a.rs", right_v.clone())]);

        let matches = discover_matches(&base, &left, &right, &config());

        let mandatory_base: Vec<_> = matches.iter().filter_map(Match::base).cloned().collect();
        let files = base.files_by_path_utilising(&mandatory_base, None);
        if let Some(file) = files.get("a.rs") {
            prop_assert_eq!(file.reconstruct(), base_v);
        }
    }

    /// Sectioning utilisation (spec §8): every mandatory section survives
    /// intact in the produced partition.
    #[test]
    fn sectioning_utilisation_keeps_mandatory_sections((base_v, left_v, right_v) in arb_trees()) {
        let base = Sources::new(Side::Base, [("a.rs", base_v.clone())]);
        let left = Sources::new(Side::Left, [("a.rs", left_v.clone())]);
        let right = Sources::new(Side::Right, [("a.rs", right_v.clone())]);

        let matches = discover_matches(&base, &left, &right, &config());
        let mandatory_base: Vec<_> = matches.iter().filter_map(Match::base).cloned().collect();
        let files = base.files_by_path_utilising(&mandatory_base, None);

        if let Some(file) = files.get("a.rs") {
            for wanted in &mandatory_base {
                prop_assert!(
                    file.sections().iter().any(|s| s == wanted),
                    "mandatory section {:?} missing from utilising partition",
                    wanted,
                );
            }
        }
    }

    /// Match kind consistency (spec §8): every section's matches all share
    /// one `MatchKind`.
    #[test]
    fn match_kind_consistency((base_v, left_v, right_v) in arb_trees()) {
        let base = Sources::new(Side::Base, [("a.rs", base_v)]);
        let left = Sources::new(Side::Left, [("a.rs", left_v)]);
        let right = Sources::new(Side::Right, [("a.rs", right_v)]);

        let matches = discover_matches(&base, &left, &right, &config());

        for m in matches.iter() {
            for s in m.sections() {
                let kinds: BTreeSet<_> = matches.matches_for(s).map(Match::kind).map(kind_rank).collect();
                prop_assert!(
                    kinds.len() <= 1,
                    "section {:?} participates in matches of more than one kind",
                    s,
                );
            }
        }
    }

    /// No redundant pairwise (spec §8): a pairwise match's two sections
    /// never both also belong to some `AllSides` match.
    #[test]
    fn no_redundant_pairwise((base_v, left_v, right_v) in arb_trees()) {
        let base = Sources::new(Side::Base, [("a.rs", base_v)]);
        let left = Sources::new(Side::Left, [("a.rs", left_v)]);
        let right = Sources::new(Side::Right, [("a.rs", right_v)]);

        let matches = discover_matches(&base, &left, &right, &config());

        for m in matches.iter() {
            if m.kind() == MatchKind::AllSides {
                continue;
            }
            let sections: Vec<_> = m.sections().collect();
            let all_sides_count = sections
                .iter()
                .filter(|s| matches.matches_for(*s).any(|other| other.kind() == MatchKind::AllSides))
                .count();
            prop_assert!(
                all_sides_count < sections.len(),
                "pairwise match {:?} has all of its sections covered by an AllSides match",
                m,
            );
        }
    }

    /// No double-side subsumption (spec §8): an `AllSides` match's sections
    /// are never simultaneously overlapped by other matches on two or more
    /// sides.
    #[test]
    fn no_double_side_subsumption((base_v, left_v, right_v) in arb_trees()) {
        let base = Sources::new(Side::Base, [("a.rs", base_v)]);
        let left = Sources::new(Side::Left, [("a.rs", left_v)]);
        let right = Sources::new(Side::Right, [("a.rs", right_v)]);

        let matches = discover_matches(&base, &left, &right, &config());

        for m in matches.iter() {
            let Match::AllSides { base, left, right } = m else { continue };
            let sides: [&kinetic_merge::Section<u32>; 3] = [base, left, right];
            let overlapped = sides
                .into_iter()
                .filter(|s: &&kinetic_merge::Section<u32>| {
                    matches
                        .matches_for(*s)
                        .any(|other| !std::ptr::eq(other, m) && other.sections().any(|os| os.overlaps(*s) && os != *s))
                })
                .count();
            prop_assert!(overlapped < 2, "AllSides match {:?} is subsumed on two or more sides", m);
        }
    }
}

fn kind_rank(k: MatchKind) -> u8 {
    match k {
        MatchKind::AllSides => 0,
        MatchKind::BaseAndLeft => 1,
        MatchKind::BaseAndRight => 2,
        MatchKind::LeftAndRight => 3,
    }
}
