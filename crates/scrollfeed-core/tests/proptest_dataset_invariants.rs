//! Property-based invariant tests for the dataset and snapshot builder.
//!
//! 1. Every section holds exactly `page_size` items.
//! 2. Item values follow `section * page_size + row + 1`.
//! 3. Item values are unique across the dataset.
//! 4. Appending never reorders or removes prior sections.
//! 5. Appending out-of-range or duplicate sections leaves no partial result.

use proptest::prelude::*;
use scrollfeed_core::{FeedError, ListState, Snapshot, build_initial_dataset};
use std::collections::HashSet;

// ── Strategies ────────────────────────────────────────────────────────────

fn shape_strategy() -> impl Strategy<Value = (usize, usize)> {
    (0usize..=40, 0usize..=25)
}

proptest! {
    #[test]
    fn sections_have_page_size_items((total, page) in shape_strategy()) {
        let dataset = build_initial_dataset(total, page);
        prop_assert_eq!(dataset.len(), total);
        for section in dataset.iter() {
            prop_assert_eq!(section.len(), page);
        }
    }

    #[test]
    fn item_values_follow_formula((total, page) in shape_strategy()) {
        let dataset = build_initial_dataset(total, page);
        for (n, section) in dataset.iter().enumerate() {
            prop_assert_eq!(section.index(), n);
            for (r, item) in section.items().iter().enumerate() {
                prop_assert_eq!(item.value(), (n * page + r + 1) as u64);
            }
        }
    }

    #[test]
    fn item_values_are_unique((total, page) in shape_strategy()) {
        let dataset = build_initial_dataset(total, page);
        let mut seen = HashSet::new();
        for section in dataset.iter() {
            for item in section.items() {
                prop_assert!(seen.insert(item.value()));
            }
        }
    }

    #[test]
    fn pairwise_appends_extend_prior_snapshot(total in 2usize..=30, page in 1usize..=12) {
        let list = ListState::new(build_initial_dataset(total, page));
        let mut snapshot = Snapshot::new();
        let mut cursor = 0;
        while cursor + 1 < total {
            let next = list
                .snapshot_with_appended(&snapshot, &[cursor, cursor + 1])
                .unwrap();
            prop_assert!(next.extends(&snapshot));
            prop_assert_eq!(next.section_count(), snapshot.section_count() + 2);
            snapshot = next;
            cursor += 2;
        }
        prop_assert_eq!(snapshot.section_count(), total - total % 2);
        prop_assert_eq!(snapshot.item_count(), snapshot.section_count() * page);
    }

    #[test]
    fn rejected_appends_produce_nothing(total in 1usize..=20, extra in 0usize..=5) {
        let list = ListState::new(build_initial_dataset(total, 3));
        let base = list.snapshot_with_appended(&Snapshot::new(), &[0]).unwrap();

        let out_of_range = list.snapshot_with_appended(&base, &[total + extra]);
        let is_out_of_range = matches!(out_of_range, Err(FeedError::SectionOutOfRange { .. }));
        prop_assert!(is_out_of_range);

        let duplicate = list.snapshot_with_appended(&base, &[0]);
        prop_assert!(matches!(duplicate, Err(FeedError::DuplicateSection(0))));
        prop_assert_eq!(base.section_count(), 1);
    }
}
