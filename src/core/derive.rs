//! Filter/sort engine.
//!
//! [`derive`] is the pure transformation from the merged collection to the
//! displayed collection: tag filter, then search filter, then one stable sort.
//! It never touches its input.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::RegexBuilder;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::models::{Bookmark, SortKey};

/// Derive the view collection from `all`.
pub fn derive(
    all: &[Bookmark],
    active_tag: Option<&str>,
    search_query: &str,
    sort: SortKey,
) -> Vec<Bookmark> {
    let needle = search_query.trim().to_lowercase();
    let mut view: Vec<Bookmark> = all
        .iter()
        .filter(|b| matches_tag(b, active_tag))
        .filter(|b| matches_search(b, &needle))
        .cloned()
        .collect();
    sort_bookmarks(&mut view, sort);
    view
}

/// Exact, case-sensitive tag membership; `None` keeps everything.
pub fn matches_tag(bookmark: &Bookmark, active_tag: Option<&str>) -> bool {
    active_tag.map_or(true, |tag| bookmark.has_tag(tag))
}

/// Substring match of an already-lowercased needle against every text field.
pub fn matches_search(bookmark: &Bookmark, needle: &str) -> bool {
    needle.is_empty() || search_haystack(bookmark).contains(needle)
}

fn search_haystack(bookmark: &Bookmark) -> String {
    [
        bookmark.title.as_str(),
        bookmark.description.as_deref().unwrap_or(""),
        bookmark.url.as_str(),
        &bookmark.tags.join(" "),
        bookmark.source.as_deref().unwrap_or(""),
    ]
    .join(" ")
    .to_lowercase()
}

// ── Sorting ─────────────────────────────────────────────────────────────────

/// Stable in-place sort by one key.
pub fn sort_bookmarks(items: &mut [Bookmark], sort: SortKey) {
    match sort {
        SortKey::TitleAsc => items.sort_by(|a, b| collate(&a.title, &b.title)),
        SortKey::TitleDesc => items.sort_by(|a, b| collate(&b.title, &a.title)),
        SortKey::DateNewest => items.sort_by_key(|b| std::cmp::Reverse(sort_timestamp(b))),
        SortKey::DateOldest => items.sort_by_key(sort_timestamp),
        SortKey::Source => items.sort_by(|a, b| {
            collate(
                a.source.as_deref().unwrap_or(""),
                b.source.as_deref().unwrap_or(""),
            )
        }),
    }
}

/// Locale-style comparison: base letters first, then accents, then case
/// with lowercase ordered before uppercase. Only identical strings compare
/// equal.
pub fn collate(a: &str, b: &str) -> Ordering {
    base_key(a)
        .cmp(&base_key(b))
        .then_with(|| accent_key(a).cmp(&accent_key(b)))
        .then_with(|| case_order(a, b))
}

fn base_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn accent_key(s: &str) -> String {
    s.nfkd().flat_map(char::to_lowercase).collect()
}

fn case_order(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        return match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => x.cmp(&y),
        };
    }
    a.len().cmp(&b.len())
}

/// Milliseconds since the epoch; missing or unparseable dates are the epoch.
fn sort_timestamp(bookmark: &Bookmark) -> i64 {
    bookmark
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ── Tags ────────────────────────────────────────────────────────────────────

/// A distinct tag and how many bookmarks carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Distinct tags across `all`, most used first, ties by name.
pub fn collect_tags(all: &[Bookmark]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for bookmark in all {
        for tag in &bookmark.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    tags
}

// ── Match positions ─────────────────────────────────────────────────────────

/// Byte ranges of non-overlapping, case-insensitive occurrences of `query`.
///
/// The query is matched literally; pattern metacharacters are escaped.
pub fn match_ranges(text: &str, query: &str) -> Vec<Range<usize>> {
    if query.is_empty() {
        return Vec::new();
    }
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.find_iter(text).map(|m| m.range()).collect(),
        Err(e) => {
            log::debug!("Cannot build match pattern for {query:?}: {e}");
            Vec::new()
        }
    }
}
