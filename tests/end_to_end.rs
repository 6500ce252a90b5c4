//! End-to-end merge scenarios exercising the full discovery → per-path merge
//! → motion evaluation → anchored-insertion migration → rewrite pipeline.
//!
//! Coverage:
//! - Pure edit: one side changes content, the other doesn't — clean merge.
//! - Coincident insertion: both sides insert the same content independently.
//! - Insertion opposite an unrelated deletion: both apply cleanly.
//! - Edit conflict: both sides change the same content differently.
//! - Coincident deletion plus an independent edit on the third side.
//! - Move with propagated edit: content relocates on one side while the
//!   other independently edits it; the edit should follow the move.
//! - Plain move: content relocates verbatim, no edit to propagate.

use kinetic_merge::{merge, Config, MergeResult, NoopProgress, Side, Sources};

fn config() -> Config {
    Config::new(1, 0.0, usize::MAX).expect("valid config")
}

fn run(base: Sources<u32>, left: Sources<u32>, right: Sources<u32>) -> std::collections::BTreeMap<std::sync::Arc<str>, MergeResult<u32>> {
    let mut progress = NoopProgress;
    let (results, _moves, _analysis) = merge(base, left, right, &config(), &mut progress).expect("merge should not error on these scenarios");
    results
}

#[test]
fn pure_edit_is_a_clean_merge() {
    let base = Sources::new(Side::Base, [("a.rs", vec![1u32, 2, 3, 4, 5])]);
    let left = Sources::new(Side::Left, [("a.rs", vec![1u32, 2, 99, 4, 5])]);
    let right = Sources::new(Side::Right, [("a.rs", vec![1u32, 2, 3, 4, 5])]);

    let results = run(base, left, right);
    assert_eq!(results["a.rs"], MergeResult::FullyMerged(vec![1, 2, 99, 4, 5]));
}

#[test]
fn coincident_insertion_is_applied_once() {
    let base = Sources::new(Side::Base, [("a.rs", vec![1u32, 2, 3])]);
    let left = Sources::new(Side::Left, [("a.rs", vec![1u32, 9, 2, 3])]);
    let right = Sources::new(Side::Right, [("a.rs", vec![1u32, 9, 2, 3])]);

    let results = run(base, left, right);
    assert_eq!(results["a.rs"], MergeResult::FullyMerged(vec![1, 9, 2, 3]));
}

#[test]
fn insertion_next_to_an_unrelated_deletion_merges_cleanly() {
    let base = Sources::new(Side::Base, [("a.rs", vec![1u32, 2, 3, 4])]);
    let left = Sources::new(Side::Left, [("a.rs", vec![1u32, 9, 2, 3, 4])]);
    let right = Sources::new(Side::Right, [("a.rs", vec![1u32, 2, 4])]);

    let results = run(base, left, right);
    assert_eq!(results["a.rs"], MergeResult::FullyMerged(vec![1, 9, 2, 4]));
}

#[test]
fn conflicting_edits_are_reported_as_a_conflict() {
    let base = Sources::new(Side::Base, [("a.rs", vec![1u32, 2, 3])]);
    let left = Sources::new(Side::Left, [("a.rs", vec![1u32, 8, 3])]);
    let right = Sources::new(Side::Right, [("a.rs", vec![1u32, 9, 3])]);

    let results = run(base, left, right);
    match &results["a.rs"] {
        MergeResult::MergedWithConflicts(l, r) => {
            assert_eq!(l, &vec![1, 8, 3]);
            assert_eq!(r, &vec![1, 9, 3]);
        }
        MergeResult::FullyMerged(_) => panic!("expected a conflict"),
    }
}

#[test]
fn coincident_deletion_alongside_an_independent_edit() {
    let base = Sources::new(Side::Base, [("a.rs", vec![1u32, 2, 3, 4, 5])]);
    let left = Sources::new(Side::Left, [("a.rs", vec![1u32, 4, 99, 5])]);
    let right = Sources::new(Side::Right, [("a.rs", vec![1u32, 4, 5])]);

    let results = run(base, left, right);
    assert_eq!(results["a.rs"], MergeResult::FullyMerged(vec![1, 4, 99, 5]));
}

#[test]
fn plain_move_relocates_without_touching_either_sides_content() {
    let base = Sources::new(Side::Base, [("a.rs", vec![10u32, 20, 30, 40, 50])]);
    let left = Sources::new(Side::Left, [("a.rs", vec![10u32, 50]), ("b.rs", vec![20u32, 30, 40])]);
    let right = Sources::new(Side::Right, [("a.rs", vec![10u32, 20, 30, 40, 50])]);

    let results = run(base, left, right);
    assert_eq!(results["b.rs"], MergeResult::FullyMerged(vec![20, 30, 40]));
}

#[test]
fn move_with_propagated_edit_carries_the_edit_to_the_destination() {
    // base: [B0 B1 B2] at q.rs. Left edits B1 in place (B1 -> 999). Right
    // relocates the whole run to r.rs unchanged. The edit should follow the
    // move: r.rs should end up holding left's edited content, not right's
    // unmodified copy.
    let base = Sources::new(Side::Base, [("q.rs", vec![1u32, 2, 3])]);
    let left = Sources::new(Side::Left, [("q.rs", vec![1u32, 999, 3])]);
    let right = Sources::new(Side::Right, [("r.rs", vec![1u32, 2, 3])]);

    let results = run(base, left, right);
    assert_eq!(results["r.rs"], MergeResult::FullyMerged(vec![1, 999, 3]));
}
