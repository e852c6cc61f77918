//! Test Fixtures
//!
//! Sample bookmarks, bookmark files and load reports.

use proptest::prelude::*;

use crate::core::loader::{LoadReport, LoadedFile};
use crate::core::models::{Bookmark, BookmarkFile, SortKey};

// =============================================================================
// Bookmark Fixtures
// =============================================================================

/// A small collection covering tags, descriptions, sources and dates,
/// including one bookmark with no date.
pub fn sample_bookmarks() -> Vec<Bookmark> {
    vec![
        Bookmark::new("Perplexity AI", "https://www.perplexity.ai")
            .with_tags(["ai", "search"])
            .with_source("Chrome Import")
            .with_created_at("2024-03-01T10:00:00Z"),
        Bookmark::new("The Rust Book", "https://doc.rust-lang.org/book/")
            .with_tags(["rust", "docs"])
            .with_description("The Rust programming language, from first steps to advanced topics")
            .with_created_at("2022-01-01T00:00:00Z"),
        Bookmark::new("Hacker News", "https://news.ycombinator.com").with_tags(["news"]),
        Bookmark::new("Écoute", "https://ecoute.example/podcasts")
            .with_tags(["audio"])
            .with_source("Manual")
            .with_created_at("2023-06-15"),
    ]
}

/// Wrap items in a named bookmark file.
pub fn bookmark_file(title: &str, items: Vec<Bookmark>) -> BookmarkFile {
    BookmarkFile {
        title: Some(title.to_string()),
        items,
    }
}

/// A successful load of the given files with no failures.
pub fn report_of(files: Vec<(&str, Vec<Bookmark>)>) -> LoadReport {
    LoadReport {
        loaded: files
            .into_iter()
            .map(|(name, items)| LoadedFile {
                name: name.to_string(),
                file: bookmark_file(name, items),
            })
            .collect(),
        failures: Vec::new(),
    }
}

// =============================================================================
// Strategies
// =============================================================================

const TAG_POOL: &[&str] = &["ai", "rust", "news", "search", "tools", "Docs"];

/// An arbitrary bookmark drawn from a small tag pool so filters hit.
pub fn arb_bookmark() -> impl Strategy<Value = Bookmark> {
    (
        "[A-Za-zé ]{0,12}",
        "[a-z]{1,8}",
        prop::sample::subsequence(TAG_POOL.to_vec(), 0..=3),
        prop::option::of("[a-z ]{0,16}"),
        prop::option::of(0i64..2_000_000_000),
        prop::option::of(prop_oneof![Just("Chrome Import"), Just("Manual")]),
    )
        .prop_map(|(title, host, tags, description, secs, source)| {
            let mut bookmark = Bookmark::new(title, format!("https://{host}.example"))
                .with_tags(tags.into_iter().map(str::to_string));
            bookmark.description = description;
            bookmark.created_at = secs
                .and_then(|s| chrono::DateTime::<chrono::Utc>::from_timestamp(s, 0))
                .map(|d| d.to_rfc3339());
            bookmark.source = source.map(str::to_string);
            bookmark
        })
}

pub fn arb_sort_key() -> impl Strategy<Value = SortKey> {
    prop::sample::select(SortKey::ALL.to_vec())
}

pub fn arb_active_tag() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(TAG_POOL.to_vec()).prop_map(str::to_string))
}

pub fn arb_query() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-z]{1,3}", Just("RUST".to_string())]
}
