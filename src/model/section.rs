//! Section & File model (spec §3, C1 §4.1).
//!
//! Sections are the addressable unit every other component operates over: a
//! half-open range of one side's per-path element sequence. Files partition
//! a path's content into a contiguous, gap-free, overlap-free run of
//! Sections.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;

use crate::model::element::Element;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which of the three divergent inputs a [`Section`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    /// The common ancestor.
    Base,
    /// The first divergent side.
    Left,
    /// The second divergent side.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Base => "base",
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A half-open range `[start, start + length)` within one side's file at
/// `path` (spec §3).
///
/// Equality and hashing consider only `(side, path, start, length)` — two
/// sections from different sides are never equal even if their content is
/// byte-identical, and two sections with the same range but backed by
/// different element arrays still compare equal as long as the four fields
/// match (the backing array is not part of a section's identity).
#[derive(Clone)]
pub struct Section<E> {
    side: Side,
    path: Arc<str>,
    start: usize,
    length: usize,
    data: Arc<[E]>,
}

impl<E> Section<E> {
    /// Construct a section. `data` must be the full element sequence for
    /// `(side, path)`; `start + length` must not exceed `data.len()`.
    ///
    /// # Panics
    ///
    /// Panics if the range `[start, start + length)` is out of bounds for
    /// `data`. This is a construction-time contract, not a recoverable
    /// failure (spec §7: logic invariants are fatal).
    pub fn new(side: Side, path: Arc<str>, start: usize, length: usize, data: Arc<[E]>) -> Self {
        assert!(
            start + length <= data.len(),
            "section [{start}, {}) out of bounds for {path} ({} elements)",
            start + length,
            data.len()
        );
        Self {
            side,
            path,
            start,
            length,
            data,
        }
    }

    /// The side this section belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// The path within that side.
    #[must_use]
    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    /// Start offset, in elements, within the path's full sequence.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Length, in elements.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// `true` if this section spans zero elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The half-open `[start, start + length)` interval (spec §3
    /// `closedOpenInterval`).
    #[must_use]
    pub const fn closed_open_interval(&self) -> Range<usize> {
        self.start..self.start + self.length
    }

    /// This section's element content.
    #[must_use]
    pub fn content(&self) -> &[E] {
        &self.data[self.closed_open_interval()]
    }

    /// Whether `self` and `other` overlap on the same side and path. Two
    /// sections on different sides or paths never overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.side == other.side
            && self.path == other.path
            && self.start < other.start + other.length
            && other.start < self.start + self.length
    }

    /// Sum of [`Element::size`] over this section's content.
    #[must_use]
    pub fn size(&self) -> usize
    where
        E: Element,
    {
        crate::model::element::total_size(self.content())
    }

    /// A sub-section of `self` spanning `[rel_start, rel_start + rel_len)`
    /// relative to `self`'s own start (used by match discovery to carve a
    /// pairwise match's sections around a bite, spec §4.4 "Stabilization
    /// loop").
    ///
    /// # Panics
    ///
    /// Panics if `[rel_start, rel_start + rel_len)` is out of bounds for
    /// `self`.
    #[must_use]
    pub fn sub_section(&self, rel_start: usize, rel_len: usize) -> Self {
        assert!(
            rel_start + rel_len <= self.length,
            "sub-section out of bounds"
        );
        Self {
            side: self.side,
            path: self.path.clone(),
            start: self.start + rel_start,
            length: rel_len,
            data: self.data.clone(),
        }
    }
}

impl<E> fmt::Debug for Section<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("side", &self.side)
            .field("path", &self.path)
            .field("start", &self.start)
            .field("length", &self.length)
            .finish()
    }
}

impl<E> PartialEq for Section<E> {
    fn eq(&self, other: &Self) -> bool {
        self.side == other.side
            && self.path == other.path
            && self.start == other.start
            && self.length == other.length
    }
}

impl<E> Eq for Section<E> {}

impl<E> Hash for Section<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.side.hash(state);
        self.path.hash(state);
        self.start.hash(state);
        self.length.hash(state);
    }
}

impl<E> PartialOrd for Section<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Section<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.side, &self.path, self.start, self.length).cmp(&(
            other.side,
            &other.path,
            other.start,
            other.length,
        ))
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// An ordered, contiguous, gap-free, overlap-free partition of one path's
/// content into [`Section`]s (spec §3).
#[derive(Clone, Debug)]
pub struct File<E> {
    side: Side,
    path: Arc<str>,
    sections: Vec<Section<E>>,
}

impl<E> File<E> {
    /// Build a `File` from sections already known to partition the path.
    ///
    /// # Panics
    ///
    /// Panics if `sections` is empty, unsorted, contains a gap, or contains
    /// an overlap — a `File` is always a valid partition by construction.
    pub fn new(side: Side, path: Arc<str>, mut sections: Vec<Section<E>>) -> Self {
        sections.sort_by_key(Section::start);
        let mut cursor = 0usize;
        for s in &sections {
            assert_eq!(s.side(), side, "section side does not match file side");
            assert_eq!(s.path(), &path, "section path does not match file path");
            assert_eq!(
                s.start(),
                cursor,
                "sections must partition the file without gaps or overlaps"
            );
            cursor += s.length();
        }
        Self {
            side,
            path,
            sections,
        }
    }

    /// The file's side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// The file's path.
    #[must_use]
    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    /// The sections partitioning this file, in order.
    #[must_use]
    pub fn sections(&self) -> &[Section<E>] {
        &self.sections
    }

    /// Total length of the file in elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.iter().map(Section::length).sum()
    }

    /// `true` if the file has no elements (a single, zero-length section).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the section containing `offset`, via binary search on start
    /// offsets (spec §4.1 "binary-searchable index by start offset").
    #[must_use]
    pub fn section_at(&self, offset: usize) -> Option<&Section<E>> {
        match self
            .sections
            .binary_search_by(|s| s.start().cmp(&offset))
        {
            Ok(i) => Some(&self.sections[i]),
            Err(0) => None,
            Err(i) => {
                let candidate = &self.sections[i - 1];
                if candidate.closed_open_interval().contains(&offset) {
                    Some(candidate)
                } else {
                    None
                }
            }
        }
    }

    /// The index of `section` within [`Self::sections`], if it is one of
    /// them (matched by `(side, path, start, length)` identity, spec §3).
    #[must_use]
    pub fn index_of(&self, section: &Section<E>) -> Option<usize> {
        self.sections.iter().position(|s| s == section)
    }

    /// Concatenation of every section's content, reconstructing the
    /// original element sequence (spec §8 "Reconstruction" property).
    #[must_use]
    pub fn reconstruct(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.sections.iter().flat_map(Section::content).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// One side's full set of files, addressable by path (spec §6 `Sources`).
#[derive(Clone, Debug)]
pub struct Sources<E> {
    side: Side,
    files: BTreeMap<Arc<str>, Arc<[E]>>,
}

impl<E> Sources<E> {
    /// Build a `Sources` from `(path, content)` pairs.
    pub fn new<P>(side: Side, files: impl IntoIterator<Item = (P, Vec<E>)>) -> Self
    where
        P: Into<Arc<str>>,
    {
        Self {
            side,
            files: files
                .into_iter()
                .map(|(p, c)| (p.into(), Arc::from(c)))
                .collect(),
        }
    }

    /// The side this collection belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Every known path.
    pub fn paths(&self) -> impl Iterator<Item = &Arc<str>> {
        self.files.keys()
    }

    /// The full element content backing `path`, or `None` if it doesn't
    /// exist on this side.
    #[must_use]
    pub fn content_of(&self, path: &str) -> Option<&[E]> {
        self.files.get(path).map(std::convert::AsRef::as_ref)
    }

    /// Size, in elements, of `path`'s content on this side.
    #[must_use]
    pub fn file_size(&self, path: &str) -> Option<usize> {
        self.files.get(path).map(|c| c.len())
    }

    /// Build a single section covering `[start, start + length)` of `path`.
    #[must_use]
    pub fn section(&self, path: &str, start: usize, length: usize) -> Option<Section<E>> {
        let data = self.files.get(path)?.clone();
        Some(Section::new(self.side, Arc::from(path), start, length, data))
    }

    /// The path a section belongs to, if it was built from this `Sources`.
    #[must_use]
    pub fn path_for<'a>(&self, section: &'a Section<E>) -> Option<&'a Arc<str>> {
        (section.side() == self.side).then(|| section.path())
    }

    /// One whole-file section per path — the trivial (unsectioned) view.
    #[must_use]
    pub fn files_by_path(&self) -> BTreeMap<Arc<str>, File<E>> {
        self.files
            .iter()
            .map(|(path, data)| {
                let section = Section::new(self.side, path.clone(), 0, data.len(), data.clone());
                (path.clone(), File::new(self.side, path.clone(), vec![section]))
            })
            .collect()
    }

    /// Build a sectioning of every file that includes each of `mandatory`
    /// intact, with the remainder covered by gap-filler sections (spec
    /// §4.1).
    ///
    /// If `candidate_gap_chunks` is supplied, for each gap the first chunk
    /// (per path) whose content appears as a contiguous run inside that gap
    /// is used to split the gap into up to three sections: prefix,
    /// matched-chunk, suffix (each omitted if empty). Only one chunk is
    /// tried per gap, and only its first occurrence — the implementation
    /// does not search for multiple chunks or multiple occurrences of the
    /// same chunk, matching spec §4.1's stated restriction.
    #[must_use]
    pub fn files_by_path_utilising(
        &self,
        mandatory: &[Section<E>],
        candidate_gap_chunks: Option<&BTreeMap<Arc<str>, Vec<Vec<E>>>>,
    ) -> BTreeMap<Arc<str>, File<E>>
    where
        E: Element,
    {
        let mut by_path: BTreeMap<Arc<str>, Vec<Section<E>>> = BTreeMap::new();
        for s in mandatory {
            if s.side() == self.side {
                by_path.entry(s.path().clone()).or_default().push(s.clone());
            }
        }

        self.files
            .iter()
            .map(|(path, data)| {
                let mandatory_here = by_path.remove(path).unwrap_or_default();
                let chunks = candidate_gap_chunks.and_then(|m| m.get(path));
                let sections =
                    section_with_gaps(self.side, path, data, mandatory_here, chunks);
                (path.clone(), File::new(self.side, path.clone(), sections))
            })
            .collect()
    }
}

/// Fill the gaps around `mandatory` sections of `path` with gap-filler
/// sections, optionally splitting a gap around the first matching candidate
/// chunk (spec §4.1).
fn section_with_gaps<E: Element>(
    side: Side,
    path: &Arc<str>,
    data: &Arc<[E]>,
    mut mandatory: Vec<Section<E>>,
    candidate_gap_chunks: Option<&Vec<Vec<E>>>,
) -> Vec<Section<E>> {
    mandatory.sort_by_key(Section::start);

    let mut result = Vec::new();
    let mut cursor = 0usize;
    for m in mandatory {
        if m.start() > cursor {
            fill_gap(side, path, data, cursor, m.start(), candidate_gap_chunks, &mut result);
        }
        cursor = cursor.max(m.start() + m.length());
        result.push(m);
    }
    if cursor < data.len() {
        fill_gap(side, path, data, cursor, data.len(), candidate_gap_chunks, &mut result);
    }
    if result.is_empty() {
        result.push(Section::new(side, path.clone(), 0, 0, data.clone()));
    }
    result
}

/// Fill `[gap_start, gap_end)` with one, two, or three sections: an
/// unsplit gap section, or a prefix/matched-chunk/suffix split if a
/// candidate chunk is found inside it.
fn fill_gap<E: Element>(
    side: Side,
    path: &Arc<str>,
    data: &Arc<[E]>,
    gap_start: usize,
    gap_end: usize,
    candidate_gap_chunks: Option<&Vec<Vec<E>>>,
    out: &mut Vec<Section<E>>,
) {
    let gap_content = &data[gap_start..gap_end];

    let found = candidate_gap_chunks.and_then(|chunks| {
        chunks.iter().find_map(|chunk| {
            (!chunk.is_empty())
                .then(|| find_subsequence(gap_content, chunk))
                .flatten()
        })
    });

    if let Some((offset, len)) = found {
        let chunk_start = gap_start + offset;
        let chunk_end = chunk_start + len;
        if chunk_start > gap_start {
            out.push(Section::new(side, path.clone(), gap_start, chunk_start - gap_start, data.clone()));
        }
        out.push(Section::new(side, path.clone(), chunk_start, len, data.clone()));
        if chunk_end < gap_end {
            out.push(Section::new(side, path.clone(), chunk_end, gap_end - chunk_end, data.clone()));
        }
    } else {
        out.push(Section::new(side, path.clone(), gap_start, gap_end - gap_start, data.clone()));
    }
}

/// Find the first occurrence of `needle` as a contiguous run within
/// `haystack`, returning its `(offset, length)` relative to `haystack`.
fn find_subsequence<E: Element>(haystack: &[E], needle: &[E]) -> Option<(usize, usize)> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| (pos, needle.len()))
}
