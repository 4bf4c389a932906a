#![forbid(unsafe_code)]

//! Precomputed, read-only dataset of sections and items.
//!
//! The dataset is generated once from `(total_sections, page_size)` and never
//! changes afterwards. Sections share their item storage, so handing a section
//! to a [`Snapshot`](crate::Snapshot) is a reference-count bump rather than a
//! copy.

use std::fmt;
use std::sync::Arc;

/// A single row value.
///
/// Values are unique within a dataset: `section * page_size + row + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item(pub u64);

impl Item {
    /// Raw integer value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered group of items, identified by its global section index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    index: usize,
    items: Arc<[Item]>,
}

impl Section {
    /// Create a section from its index and items.
    #[must_use]
    pub fn new(index: usize, items: impl Into<Arc<[Item]>>) -> Self {
        Self {
            index,
            items: items.into(),
        }
    }

    /// Position of this section in global section order.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Items in display order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of rows in this section.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the section has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Row index of the last item, or `None` for an empty section.
    #[inline]
    #[must_use]
    pub fn last_row(&self) -> Option<usize> {
        self.items.len().checked_sub(1)
    }
}

/// The full ordered set of sections available for pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    sections: Vec<Section>,
    page_size: usize,
}

impl Dataset {
    /// Number of sections.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Rows per section.
    #[inline]
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Section at `index`, if in range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Whether `index` addresses an existing section.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index < self.sections.len()
    }

    /// Iterate sections in order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}

/// Build the dataset: `total_sections` sections of `page_size` items each.
///
/// Section `n`, row `r` holds `n * page_size + r + 1`. Allocates every item
/// up front; check [`FeedConfig::check_capacity`](crate::FeedConfig::check_capacity)
/// before building from untrusted sizes.
#[must_use]
pub fn build_initial_dataset(total_sections: usize, page_size: usize) -> Dataset {
    let sections = (0..total_sections)
        .map(|section| {
            let base = section as u64 * page_size as u64;
            let items: Vec<Item> = (0..page_size)
                .map(|row| Item(base + row as u64 + 1))
                .collect();
            Section::new(section, items)
        })
        .collect();
    Dataset {
        sections,
        page_size,
    }
}
