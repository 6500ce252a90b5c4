//! Three-way longest common subsequence engine (spec §4.3, C3).
//!
//! Tags each of three input sequences with a [`Contribution`] per element,
//! maximizing the lexicographic `(three-side common size, pairwise common
//! size)` score described in spec §4.3, and also hands back the backbone as
//! a single ordered walk ([`AlignStep`]) so a consumer that needs to know
//! *which* left element a `BaseAndLeft` tag paired with — not just that base
//! position 3 and left position 5 both got that tag — doesn't have to
//! re-derive it from three independently-advancing tag arrays.
//!
//! # Implementation note
//!
//! Spec §4.3 describes a swathe-indexed DP bounded by `O(n² + m² + p²)`
//! entries, retaining only the leading and preceding swathes. This
//! implementation instead fills the full `(n+1) × (m+1) × (p+1)` table —
//! the same recurrence and the same optimal tagging, just without the
//! memory-bounded optimization. Correctness (spec §4.3's contract) does not
//! depend on the swathe bookkeeping; it is a performance optimization spec
//! §9 allows omitting ("an implementation may omit them at the cost of
//! repeated work"). This crate favors the simpler, directly-verifiable
//! table over the swathe variant.

/// How one element of an input sequence contributed to the three-way
/// merge's backbone (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Contribution {
    /// Present, equivalent, on all three sides at this position.
    Common,
    /// Equivalent between base and left only.
    CommonToBaseAndLeftOnly,
    /// Equivalent between base and right only.
    CommonToBaseAndRightOnly,
    /// Equivalent between left and right only (a coincident insertion).
    CommonToLeftAndRightOnly,
    /// Not part of any common run at this position.
    Difference,
}

/// One step of the backbone walk, in left-to-right alignment order (spec
/// §4.5's "walk the tagged streams"). Unlike the per-sequence
/// [`Contribution`] arrays, a step carries the actual paired values, so a
/// `BaseAndLeft` step says outright which left element matched which base
/// element instead of leaving the caller to line up two tag arrays by
/// position.
#[derive(Clone, Debug)]
pub enum AlignStep<T> {
    /// Equivalent on all three sides.
    Common(T),
    /// Equivalent between base and left only; right has nothing paired here.
    BaseAndLeft { base: T, left: T },
    /// Equivalent between base and right only; left has nothing paired here.
    BaseAndRight { base: T, right: T },
    /// Equivalent between left and right only (a coincident insertion).
    LeftAndRight { left: T, right: T },
    /// A base element with no equivalent on either side.
    DiffBase(T),
    /// A left element with no equivalent on base or right.
    DiffLeft(T),
    /// A right element with no equivalent on base or left.
    DiffRight(T),
}

/// The tagged output of [`three_way_lcs`]: one [`Contribution`] per element
/// of each of the three original inputs, so `base.len()`, `left.len()`, and
/// `right.len()` equal the corresponding input lengths (spec §8 "LCS
/// properties"), plus the same backbone as an ordered [`AlignStep`] walk.
#[derive(Clone, Debug)]
pub struct ThreeWayLcsResult<T> {
    /// Tags aligned to the base input.
    pub base: Vec<Contribution>,
    /// Tags aligned to the left input.
    pub left: Vec<Contribution>,
    /// Tags aligned to the right input.
    pub right: Vec<Contribution>,
    /// The backbone as one ordered walk, values included.
    pub steps: Vec<AlignStep<T>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Move {
    Start,
    AllThree,
    BaseLeft,
    BaseRight,
    LeftRight,
    DifferenceLeft,
    DifferenceBase,
    DifferenceRight,
}

#[derive(Clone, Copy, Debug, Default)]
struct Score {
    three_side: u64,
    pairwise: u64,
}

impl Score {
    fn plus_three_side(self, amount: u64) -> Self {
        Self {
            three_side: self.three_side + amount,
            pairwise: self.pairwise,
        }
    }

    fn plus_pairwise(self, amount: u64) -> Self {
        Self {
            three_side: self.three_side,
            pairwise: self.pairwise + amount,
        }
    }

    fn key(self) -> (u64, u64) {
        (self.three_side, self.pairwise)
    }
}

/// Tag `base`, `left`, and `right` with [`Contribution`]s maximizing the
/// `(three-side common size, pairwise common size)` score (spec §4.3), and
/// hand back the same backbone as an ordered, value-carrying walk.
///
/// `equivalent` decides whether two elements (possibly of different
/// sequences) should be treated as the same content for the purpose of the
/// backbone; `size_of` gives each element's contribution to the score (spec
/// §3 `Element::size`). Degenerate empty inputs produce empty tagged
/// sequences (spec §4.3 "Failure: None").
pub fn three_way_lcs<T: Clone>(
    base: &[T],
    left: &[T],
    right: &[T],
    equivalent: impl Fn(&T, &T) -> bool,
    size_of: impl Fn(&T) -> usize,
) -> ThreeWayLcsResult<T> {
    let n = base.len();
    let m = left.len();
    let p = right.len();

    let dim_j = m + 1;
    let dim_k = p + 1;
    let idx = |i: usize, j: usize, k: usize| (i * dim_j + j) * dim_k + k;

    let mut scores = vec![Score::default(); (n + 1) * dim_j * dim_k];
    let mut moves = vec![Move::Start; (n + 1) * dim_j * dim_k];

    for i in 0..=n {
        for j in 0..=m {
            for k in 0..=p {
                if i == 0 && j == 0 && k == 0 {
                    continue;
                }
                let mut best: Option<(Score, Move)> = None;
                let mut consider = |candidate: Score, mv: Move| {
                    let better = match best {
                        None => true,
                        Some((b, _)) => candidate.key() > b.key(),
                    };
                    if better {
                        best = Some((candidate, mv));
                    }
                };

                if i > 0 && j > 0 && k > 0 && equivalent(&base[i - 1], &left[j - 1]) && equivalent(&left[j - 1], &right[k - 1]) {
                    let prev = scores[idx(i - 1, j - 1, k - 1)];
                    let size = size_of(&base[i - 1]) as u64;
                    consider(prev.plus_three_side(size), Move::AllThree);
                }
                if i > 0 && j > 0 && equivalent(&base[i - 1], &left[j - 1]) {
                    let prev = scores[idx(i - 1, j - 1, k)];
                    let size = size_of(&base[i - 1]) as u64;
                    consider(prev.plus_pairwise(size), Move::BaseLeft);
                }
                if j > 0 && k > 0 && equivalent(&left[j - 1], &right[k - 1]) {
                    let prev = scores[idx(i, j - 1, k - 1)];
                    let size = size_of(&left[j - 1]) as u64;
                    consider(prev.plus_pairwise(size), Move::LeftRight);
                }
                if i > 0 && k > 0 && equivalent(&base[i - 1], &right[k - 1]) {
                    let prev = scores[idx(i - 1, j, k - 1)];
                    let size = size_of(&base[i - 1]) as u64;
                    consider(prev.plus_pairwise(size), Move::BaseRight);
                }
                if j > 0 {
                    consider(scores[idx(i, j - 1, k)], Move::DifferenceLeft);
                }
                if i > 0 {
                    consider(scores[idx(i - 1, j, k)], Move::DifferenceBase);
                }
                if k > 0 {
                    consider(scores[idx(i, j, k - 1)], Move::DifferenceRight);
                }

                let (score, mv) = best.expect("at least one predecessor exists for i+j+k > 0");
                scores[idx(i, j, k)] = score;
                moves[idx(i, j, k)] = mv;
            }
        }
    }

    let mut base_tags = vec![Contribution::Difference; n];
    let mut left_tags = vec![Contribution::Difference; m];
    let mut right_tags = vec![Contribution::Difference; p];
    let mut steps = Vec::new();

    let (mut i, mut j, mut k) = (n, m, p);
    while i > 0 || j > 0 || k > 0 {
        match moves[idx(i, j, k)] {
            Move::AllThree => {
                base_tags[i - 1] = Contribution::Common;
                left_tags[j - 1] = Contribution::Common;
                right_tags[k - 1] = Contribution::Common;
                steps.push(AlignStep::Common(base[i - 1].clone()));
                i -= 1;
                j -= 1;
                k -= 1;
            }
            Move::BaseLeft => {
                base_tags[i - 1] = Contribution::CommonToBaseAndLeftOnly;
                left_tags[j - 1] = Contribution::CommonToBaseAndLeftOnly;
                steps.push(AlignStep::BaseAndLeft {
                    base: base[i - 1].clone(),
                    left: left[j - 1].clone(),
                });
                i -= 1;
                j -= 1;
            }
            Move::BaseRight => {
                base_tags[i - 1] = Contribution::CommonToBaseAndRightOnly;
                right_tags[k - 1] = Contribution::CommonToBaseAndRightOnly;
                steps.push(AlignStep::BaseAndRight {
                    base: base[i - 1].clone(),
                    right: right[k - 1].clone(),
                });
                i -= 1;
                k -= 1;
            }
            Move::LeftRight => {
                left_tags[j - 1] = Contribution::CommonToLeftAndRightOnly;
                right_tags[k - 1] = Contribution::CommonToLeftAndRightOnly;
                steps.push(AlignStep::LeftAndRight {
                    left: left[j - 1].clone(),
                    right: right[k - 1].clone(),
                });
                j -= 1;
                k -= 1;
            }
            Move::DifferenceLeft => {
                steps.push(AlignStep::DiffLeft(left[j - 1].clone()));
                j -= 1;
            }
            Move::DifferenceBase => {
                steps.push(AlignStep::DiffBase(base[i - 1].clone()));
                i -= 1;
            }
            Move::DifferenceRight => {
                steps.push(AlignStep::DiffRight(right[k - 1].clone()));
                k -= 1;
            }
            Move::Start => unreachable!("Start move only occupies (0,0,0)"),
        }
    }
    steps.reverse();

    ThreeWayLcsResult {
        base: base_tags,
        left: left_tags,
        right: right_tags,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq_u32(a: &u32, b: &u32) -> bool {
        a == b
    }

    fn size_u32(_: &u32) -> usize {
        1
    }

    #[test]
    fn tagged_lengths_match_inputs() {
        let base = vec![1u32, 2, 3];
        let left = vec![1u32, 4, 2, 3];
        let right = vec![1u32, 2, 5, 3];
        let result = three_way_lcs(&base, &left, &right, eq_u32, size_u32);
        assert_eq!(result.base.len(), base.len());
        assert_eq!(result.left.len(), left.len());
        assert_eq!(result.right.len(), right.len());
    }

    #[test]
    fn common_backbone_matches_across_sides() {
        let base = vec![1u32, 2, 3];
        let left = vec![1u32, 2, 3];
        let right = vec![1u32, 2, 3];
        let result = three_way_lcs(&base, &left, &right, eq_u32, size_u32);
        assert!(result.base.iter().all(|c| matches!(c, Contribution::Common)));
        assert!(result.left.iter().all(|c| matches!(c, Contribution::Common)));
        assert!(result.right.iter().all(|c| matches!(c, Contribution::Common)));
    }

    #[test]
    fn removing_difference_yields_equivalent_sequences() {
        let base = vec![1u32, 2, 3];
        let left = vec![1u32, 9, 2, 3];
        let right = vec![1u32, 2, 3, 9];
        let result = three_way_lcs(&base, &left, &right, eq_u32, size_u32);

        let common_base: Vec<u32> = base
            .iter()
            .zip(&result.base)
            .filter(|(_, c)| !matches!(c, Contribution::Difference))
            .map(|(e, _)| *e)
            .collect();
        let common_left: Vec<u32> = left
            .iter()
            .zip(&result.left)
            .filter(|(_, c)| !matches!(c, Contribution::Difference))
            .map(|(e, _)| *e)
            .collect();
        let common_right: Vec<u32> = right
            .iter()
            .zip(&result.right)
            .filter(|(_, c)| !matches!(c, Contribution::Difference))
            .map(|(e, _)| *e)
            .collect();

        assert_eq!(common_base, common_left);
        assert_eq!(common_base, common_right);
    }

    #[test]
    fn empty_inputs_produce_empty_output() {
        let result = three_way_lcs::<u32>(&[], &[], &[], eq_u32, size_u32);
        assert!(result.base.is_empty());
        assert!(result.left.is_empty());
        assert!(result.right.is_empty());
        assert!(result.steps.is_empty());
    }

    #[test]
    fn steps_reconstruct_each_input_in_order() {
        let base = vec![1u32, 2, 3];
        let left = vec![1u32, 9, 2, 3];
        let right = vec![1u32, 2, 3, 9];
        let result = three_way_lcs(&base, &left, &right, eq_u32, size_u32);

        let mut base_seen = Vec::new();
        let mut left_seen = Vec::new();
        let mut right_seen = Vec::new();
        for step in &result.steps {
            match step {
                AlignStep::Common(v) => {
                    base_seen.push(*v);
                    left_seen.push(*v);
                    right_seen.push(*v);
                }
                AlignStep::BaseAndLeft { base, left } => {
                    base_seen.push(*base);
                    left_seen.push(*left);
                }
                AlignStep::BaseAndRight { base, right } => {
                    base_seen.push(*base);
                    right_seen.push(*right);
                }
                AlignStep::LeftAndRight { left, right } => {
                    left_seen.push(*left);
                    right_seen.push(*right);
                }
                AlignStep::DiffBase(v) => base_seen.push(*v),
                AlignStep::DiffLeft(v) => left_seen.push(*v),
                AlignStep::DiffRight(v) => right_seen.push(*v),
            }
        }
        assert_eq!(base_seen, base);
        assert_eq!(left_seen, left);
        assert_eq!(right_seen, right);
    }
}
