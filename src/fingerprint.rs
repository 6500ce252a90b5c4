//! Rolling fingerprint over a sliding window of element hashes (spec §4.2,
//! C2).
//!
//! Each element is first reduced to a fixed-width byte digest
//! ([`ELEMENT_HASH_BYTES`] bytes); the rolling hash then operates on the
//! concatenation of those digests, exactly as spec §4.2 describes: "The
//! window size is `elementHashBytes × windowSizeInElements`." Two
//! independently constructed instances of the same configuration produce
//! identical fingerprint sequences over the same input, since the hash is a
//! pure function of the bytes pushed (spec §4.2 "Guarantee").
//!
//! Collisions are possible by construction (a 64-bit digest over arbitrary
//! content); callers must still compare content on a tie, which is exactly
//! what `crate::discovery`'s fingerprint-grouping (`PotentialMatchKey`, spec
//! §4.4) does.

use std::collections::{HashMap, VecDeque};
use std::num::Wrapping;
use std::sync::Arc;

use crate::model::element::Element;

/// Width, in bytes, of a single element's digest.
pub const ELEMENT_HASH_BYTES: usize = 8;

/// Odd multiplicative base for the polynomial rolling hash (the FNV-1a
/// prime; any odd `u64` has a well-defined role here since we work modulo
/// `2^64` via wrapping arithmetic).
const BASE: Wrapping<u64> = Wrapping(0x0000_0100_0000_01B3);

/// Reduce one element to a fixed-width digest via FNV-1a over its funnel
/// bytes.
#[must_use]
pub fn element_digest<E: Element>(element: &E) -> [u8; ELEMENT_HASH_BYTES] {
    let mut buf = Vec::new();
    element.funnel(&mut buf);
    fnv1a(&buf).to_le_bytes()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = Wrapping(0xcbf2_9ce4_8422_2325_u64);
    for &b in bytes {
        hash ^= Wrapping(u64::from(b));
        hash *= BASE;
    }
    hash.0
}

fn wrapping_pow(base: Wrapping<u64>, mut exp: usize) -> Wrapping<u64> {
    let mut result = Wrapping(1u64);
    let mut b = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result *= b;
        }
        b *= b;
        exp >>= 1;
    }
    result
}

// ---------------------------------------------------------------------------
// RollingFingerprintFactory
// ---------------------------------------------------------------------------

/// Precomputed configuration for a given element-window size: the byte
/// width of the window and the multiplier used to "forget" the oldest byte
/// on each slide.
///
/// Cheap to clone; intended to be built once per window size and reused
/// (spec §5 "a bounded cache keyed by window size holds rolling-hash
/// factory instances; it is write-once, read-many").
#[derive(Clone, Copy, Debug)]
pub struct RollingFingerprintFactory {
    window_size_in_elements: usize,
    window_bytes: usize,
    high_order_multiplier: Wrapping<u64>,
}

impl RollingFingerprintFactory {
    /// Build a factory for a window of `window_size_in_elements` elements.
    #[must_use]
    pub fn new(window_size_in_elements: usize) -> Self {
        let window_bytes = window_size_in_elements * ELEMENT_HASH_BYTES;
        let high_order_multiplier = if window_bytes == 0 {
            Wrapping(1)
        } else {
            wrapping_pow(BASE, window_bytes - 1)
        };
        Self {
            window_size_in_elements,
            window_bytes,
            high_order_multiplier,
        }
    }

    /// The configured window size, in elements.
    #[must_use]
    pub const fn window_size_in_elements(&self) -> usize {
        self.window_size_in_elements
    }

    /// The configured window size, in bytes.
    #[must_use]
    pub const fn window_bytes(&self) -> usize {
        self.window_bytes
    }

    /// Start a fresh rolling fingerprint for this configuration.
    #[must_use]
    pub fn start(&self) -> RollingFingerprint {
        RollingFingerprint {
            factory: *self,
            buffer: VecDeque::with_capacity(self.window_bytes),
            hash: Wrapping(0),
        }
    }
}

// ---------------------------------------------------------------------------
// RollingFingerprintFactoryCache
// ---------------------------------------------------------------------------

/// A write-once, read-many cache of [`RollingFingerprintFactory`] instances
/// keyed by window size in elements (spec §5). No eviction is needed for
/// correctness (spec §9 "Caching"): an implementation may omit this cache
/// entirely and recompute the multiplier, which is cheap but not free when
/// the sure-fire binary chop revisits the same window size repeatedly.
#[derive(Clone, Debug, Default)]
pub struct RollingFingerprintFactoryCache {
    factories: HashMap<usize, Arc<RollingFingerprintFactory>>,
}

impl RollingFingerprintFactoryCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The factory for `window_size_in_elements`, building and caching it
    /// on first request.
    pub fn factory_for(&mut self, window_size_in_elements: usize) -> Arc<RollingFingerprintFactory> {
        self.factories
            .entry(window_size_in_elements)
            .or_insert_with(|| Arc::new(RollingFingerprintFactory::new(window_size_in_elements)))
            .clone()
    }
}

// ---------------------------------------------------------------------------
// RollingFingerprint
// ---------------------------------------------------------------------------

/// An in-progress rolling hash over a sliding window of bytes.
#[derive(Clone, Debug)]
pub struct RollingFingerprint {
    factory: RollingFingerprintFactory,
    buffer: VecDeque<u8>,
    hash: Wrapping<u64>,
}

impl RollingFingerprint {
    /// Push one byte, returning the window's fingerprint once
    /// `window_bytes` bytes have been pushed (`None` before the window
    /// first fills).
    pub fn push_byte(&mut self, byte: u8) -> Option<u64> {
        if self.buffer.len() == self.factory.window_bytes {
            let removed = self
                .buffer
                .pop_front()
                .expect("buffer at capacity must be non-empty");
            self.hash -= Wrapping(u64::from(removed)) * self.factory.high_order_multiplier;
        }
        self.hash = self.hash * BASE + Wrapping(u64::from(byte));
        self.buffer.push_back(byte);
        (self.buffer.len() == self.factory.window_bytes).then_some(self.hash.0)
    }

    /// Push a whole element digest's bytes, returning the fingerprint once
    /// the window is element-aligned and full.
    pub fn push_element_digest(&mut self, digest: &[u8]) -> Option<u64> {
        let mut last = None;
        for &b in digest {
            last = self.push_byte(b);
        }
        last
    }
}

/// Fingerprint every window of `window_size_in_elements` consecutive
/// elements in `elements`. Output index `i` is the fingerprint of the
/// window starting at element offset `i`; the output has
/// `elements.len() - window_size_in_elements + 1` entries (empty if the
/// window doesn't fit).
#[must_use]
pub fn fingerprint_windows<E: Element>(elements: &[E], window_size_in_elements: usize) -> Vec<u64> {
    if window_size_in_elements == 0 || elements.len() < window_size_in_elements {
        return Vec::new();
    }
    let factory = RollingFingerprintFactory::new(window_size_in_elements);
    let mut roller = factory.start();
    let mut out = Vec::with_capacity(elements.len() - window_size_in_elements + 1);
    for e in elements {
        if let Some(fp) = roller.push_element_digest(&element_digest(e)) {
            out.push(fp);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_instances_agree() {
        let data: Vec<u32> = (0..50).collect();
        let a = fingerprint_windows(&data, 5);
        let b = fingerprint_windows(&data, 5);
        assert_eq!(a, b);
        assert_eq!(a.len(), 46);
    }

    #[test]
    fn identical_windows_fingerprint_identically() {
        let data: Vec<u32> = vec![1, 2, 3, 1, 2, 3];
        let fps = fingerprint_windows(&data, 3);
        assert_eq!(fps[0], fps[3]);
    }

    #[test]
    fn differing_windows_almost_always_differ() {
        let data: Vec<u32> = vec![1, 2, 3, 4, 5, 6, 7];
        let fps = fingerprint_windows(&data, 3);
        // Not a correctness requirement (collisions are legal) but exercises
        // that the common case of distinct content yields distinct output.
        let mut sorted = fps.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), fps.len());
    }

    #[test]
    fn window_too_large_yields_empty() {
        let data: Vec<u32> = vec![1, 2];
        assert!(fingerprint_windows(&data, 5).is_empty());
    }

    #[test]
    fn factory_cache_returns_same_configuration() {
        let mut cache = RollingFingerprintFactoryCache::new();
        let a = cache.factory_for(4);
        let b = cache.factory_for(4);
        assert_eq!(a.window_bytes(), b.window_bytes());
    }
}
