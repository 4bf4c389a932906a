#![forbid(unsafe_code)]

//! Append-only snapshots and the list state that produces them.
//!
//! A [`Snapshot`] is the full ordered section/item structure at one point in
//! time. Snapshots are immutable; [`ListState::snapshot_with_appended`] returns
//! a new snapshot that is a strict superset of its base, with new sections at
//! the end. Prior sections are never reordered or removed, so a surface
//! applying snapshots without animation never shows rows jumping.

use crate::dataset::{Dataset, Item, Section};
use crate::error::{FeedError, FeedResult};

/// Immutable ordered projection of sections handed to a surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    sections: Vec<Section>,
}

impl Snapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sections.
    #[inline]
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total rows across all sections.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in display order.
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section identifiers in display order.
    #[must_use]
    pub fn section_indices(&self) -> Vec<usize> {
        self.sections.iter().map(Section::index).collect()
    }

    /// Whether a section with this identifier is present.
    #[must_use]
    pub fn contains_section(&self, index: usize) -> bool {
        self.sections.iter().any(|s| s.index() == index)
    }

    /// Items of the section with identifier `index`.
    #[must_use]
    pub fn items_in(&self, index: usize) -> Option<&[Item]> {
        self.sections
            .iter()
            .find(|s| s.index() == index)
            .map(Section::items)
    }

    /// Whether `self` begins with every section of `older`, in order.
    ///
    /// Holds for every snapshot produced from `older` by appending.
    #[must_use]
    pub fn extends(&self, older: &Snapshot) -> bool {
        older.sections.len() <= self.sections.len()
            && older
                .sections
                .iter()
                .zip(&self.sections)
                .all(|(a, b)| a == b)
    }
}

/// Ordered section/item collection backing the paginated list.
///
/// Holds the read-only [`Dataset`] and builds snapshots from it.
#[derive(Debug, Clone)]
pub struct ListState {
    dataset: Dataset,
}

impl ListState {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    #[inline]
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Return `base` with `sections` (and their items) appended in order.
    ///
    /// # Errors
    ///
    /// - [`FeedError::SectionOutOfRange`] if an index is not in the dataset.
    /// - [`FeedError::DuplicateSection`] if an index is already in `base` or
    ///   repeated in `sections`.
    ///
    /// On error `base` is untouched and no snapshot is produced.
    pub fn snapshot_with_appended(
        &self,
        base: &Snapshot,
        sections: &[usize],
    ) -> FeedResult<Snapshot> {
        let mut next = base.sections.clone();
        next.reserve(sections.len());
        for &index in sections {
            let section = self
                .dataset
                .get(index)
                .ok_or(FeedError::SectionOutOfRange {
                    index,
                    total: self.dataset.len(),
                })?;
            if next.iter().any(|s| s.index() == index) {
                return Err(FeedError::DuplicateSection(index));
            }
            next.push(section.clone());
        }
        Ok(Snapshot { sections: next })
    }
}
