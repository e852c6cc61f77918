//! ViewerState over merged load reports: provenance, filters and sorts
//! working together on one collection.

use rstest::rstest;

use crate::core::models::{Bookmark, BookmarkFile, SortKey};
use crate::core::render::{display_domain, render_page};
use crate::core::state::ViewerState;
use crate::tests::common::{bookmark_file, report_of, sample_bookmarks};

fn titles(state: &ViewerState) -> Vec<&str> {
    state.filtered().iter().map(|b| b.title.as_str()).collect()
}

#[test]
fn test_merged_report_keeps_file_order_and_provenance() {
    let extra = vec![Bookmark::new("Ratatui", "https://ratatui.rs").with_tags(["rust", "tui"])];
    let state = ViewerState::from_report(
        report_of(vec![("a.json", sample_bookmarks()), ("b.json", extra)]),
        SortKey::DateNewest,
    );

    assert_eq!(state.all().len(), 5);
    assert_eq!(state.all()[0].title, "Perplexity AI");
    assert_eq!(state.all()[4].title, "Ratatui");
    assert!(state.all()[..4]
        .iter()
        .all(|b| b.source_file.as_deref() == Some("a.json")));
    assert_eq!(state.all()[4].source_file.as_deref(), Some("b.json"));

    let rust = state.tags().iter().find(|t| t.tag == "rust").unwrap();
    assert_eq!(rust.count, 2);
}

#[rstest]
#[case(SortKey::TitleAsc, &["Écoute", "Hacker News", "Perplexity AI", "The Rust Book"])]
#[case(SortKey::TitleDesc, &["The Rust Book", "Perplexity AI", "Hacker News", "Écoute"])]
#[case(SortKey::DateNewest, &["Perplexity AI", "Écoute", "The Rust Book", "Hacker News"])]
#[case(SortKey::DateOldest, &["Hacker News", "The Rust Book", "Écoute", "Perplexity AI"])]
fn test_sample_sorts(#[case] sort: SortKey, #[case] expected: &[&str]) {
    let state = ViewerState::from_report(report_of(vec![("a.json", sample_bookmarks())]), sort);
    assert_eq!(titles(&state), expected);
}

#[test]
fn test_tag_and_search_combine() {
    let mut state = ViewerState::from_report(
        report_of(vec![("a.json", sample_bookmarks())]),
        SortKey::TitleAsc,
    );

    state.set_search_query("perp");
    assert_eq!(titles(&state), vec!["Perplexity AI"]);

    state.set_active_tag(Some("search".to_string()));
    assert_eq!(titles(&state), vec!["Perplexity AI"]);

    state.set_active_tag(Some("news".to_string()));
    assert!(state.filtered().is_empty());

    state.set_search_query("");
    assert_eq!(titles(&state), vec!["Hacker News"]);
    assert_eq!(display_domain(&state.all()[0].url), "perplexity.ai");
}

#[test]
fn test_bookmark_file_json_shape() {
    let file = bookmark_file("Reading list", sample_bookmarks());
    let json = serde_json::to_string(&file).unwrap();
    let parsed: BookmarkFile = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.title.as_deref(), Some("Reading list"));
    assert_eq!(parsed.items, sample_bookmarks());
}

#[test]
fn test_rendered_page_counts_match_state() {
    let mut state = ViewerState::from_report(
        report_of(vec![("a.json", sample_bookmarks())]),
        SortKey::DateNewest,
    );
    state.set_active_tag(Some("rust".to_string()));
    let html = render_page(&state, "Bookmarks");
    assert!(html.contains("The Rust Book"));
    assert!(!html.contains("Hacker News"));
}
