//! The `Element` trait — the opaque content unit sections are built from
//! (spec §3, §6).
//!
//! Kinetic Merge never interprets element content itself (spec §1 Non-goals:
//! "Semantic or syntactic understanding of programming languages"); it only
//! needs an element to be comparable, orderable, hashable via byte
//! serialization, and to report its own size.

/// A single element of an input sequence (typically a token).
///
/// Implementations are expected to be cheap to clone — sections hold
/// borrowed slices, but matches and merge results copy elements when
/// building their output sequences (C8 explosion, spec §4.8).
pub trait Element: Clone + Eq + Ord {
    /// Serialize this element's content into `out` for fingerprinting
    /// (spec §4.2) and exact content comparison when fingerprints collide.
    ///
    /// Two elements that compare equal under `Eq` must funnel to the same
    /// bytes, and vice versa — the funnel is used as a stand-in for equality
    /// inside hot loops that only have byte buffers to compare.
    fn funnel(&self, out: &mut Vec<u8>);

    /// Non-negative size contribution of this element, used by the LCS
    /// engine's score (spec §4.3) and the per-file threshold computation
    /// (spec §4.4). Most token-like elements return `1`.
    fn size(&self) -> usize;
}

impl Element for u32 {
    fn funnel(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn size(&self) -> usize {
        1
    }
}

impl Element for u8 {
    fn funnel(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    fn size(&self) -> usize {
        1
    }
}

impl Element for String {
    fn funnel(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }

    fn size(&self) -> usize {
        1
    }
}

/// Funnel a whole slice of elements into a byte buffer, used when computing
/// a [`crate::fingerprint::RollingFingerprint`] window or comparing two
/// sections' content directly (spec §4.2, §4.4 `PotentialMatchKey`).
pub fn funnel_all<E: Element>(elements: &[E], out: &mut Vec<u8>) {
    for e in elements {
        e.funnel(out);
    }
}

/// Sum of [`Element::size`] across a slice, the size metric the LCS score
/// (spec §4.3) and match eligibility (spec §4.4) are computed from.
#[must_use]
pub fn total_size<E: Element>(elements: &[E]) -> usize {
    elements.iter().map(Element::size).sum()
}
