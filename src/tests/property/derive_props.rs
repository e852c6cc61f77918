//! Property-based tests for the filter/sort engine
//!
//! Tests invariants:
//! - No fabrication: every output item comes from the input
//! - No loss: every item passing both filters appears exactly once
//! - Idempotence of filtering
//! - Title ordering reversal

use std::collections::HashSet;

use proptest::prelude::*;

use crate::core::derive::{derive, matches_search, matches_tag};
use crate::core::models::{Bookmark, SortKey};
use crate::tests::common::{arb_active_tag, arb_bookmark, arb_query, arb_sort_key};

fn count(items: &[Bookmark], needle: &Bookmark) -> usize {
    items.iter().filter(|b| *b == needle).count()
}

proptest! {
    #[test]
    fn output_is_exactly_the_matching_items(
        all in prop::collection::vec(arb_bookmark(), 0..20),
        tag in arb_active_tag(),
        query in arb_query(),
        sort in arb_sort_key(),
    ) {
        let out = derive(&all, tag.as_deref(), &query, sort);
        let needle = query.trim().to_lowercase();

        for item in &out {
            prop_assert!(all.contains(item));
            prop_assert!(matches_tag(item, tag.as_deref()));
            prop_assert!(matches_search(item, &needle));
        }

        for item in &all {
            let expected = if matches_tag(item, tag.as_deref()) && matches_search(item, &needle) {
                count(&all, item)
            } else {
                0
            };
            prop_assert_eq!(count(&out, item), expected);
        }
    }

    #[test]
    fn filtering_is_idempotent(
        all in prop::collection::vec(arb_bookmark(), 0..20),
        tag in arb_active_tag(),
        query in arb_query(),
        sort in arb_sort_key(),
    ) {
        let once = derive(&all, tag.as_deref(), &query, sort);
        let twice = derive(&once, tag.as_deref(), &query, sort);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn derive_never_mutates_source(
        all in prop::collection::vec(arb_bookmark(), 0..20),
        sort in arb_sort_key(),
    ) {
        let before = all.clone();
        let _ = derive(&all, None, "", sort);
        prop_assert_eq!(all, before);
    }

    #[test]
    fn title_desc_reverses_title_asc(
        all in prop::collection::vec(arb_bookmark(), 0..20),
    ) {
        let mut seen = HashSet::new();
        let distinct: Vec<Bookmark> = all
            .into_iter()
            .filter(|b| seen.insert(b.title.clone()))
            .collect();

        let asc = derive(&distinct, None, "", SortKey::TitleAsc);
        let mut desc = derive(&distinct, None, "", SortKey::TitleDesc);
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }

    #[test]
    fn date_newest_is_non_increasing(
        all in prop::collection::vec(arb_bookmark(), 0..20),
    ) {
        let out = derive(&all, None, "", SortKey::DateNewest);
        let stamps: Vec<i64> = out
            .iter()
            .map(|b| {
                b.created_at
                    .as_deref()
                    .and_then(crate::core::derive::parse_timestamp)
                    .map(|d| d.timestamp_millis())
                    .unwrap_or(0)
            })
            .collect();
        prop_assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
    }
}
