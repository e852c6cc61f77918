//! HTML rendering for the derived bookmark view.
//!
//! Every function here is a pure data-to-text step. User-controlled text is
//! always escaped first; search highlighting then runs over the escaped text.

use std::fmt::Write as _;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use super::derive::{match_ranges, parse_timestamp, TagCount};
use super::models::Bookmark;
use super::state::ViewerState;

static ENTITY: OnceLock<Regex> = OnceLock::new();

fn entity_pattern() -> &'static Regex {
    ENTITY.get_or_init(|| {
        Regex::new(r"&(?:[A-Za-z]+|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("entity pattern is valid")
    })
}

// ============================================================================
// Text helpers
// ============================================================================

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap case-insensitive occurrences of `query` in `<mark>`.
///
/// `escaped` must already be HTML-escaped. The query is escaped the same way
/// before matching, and matches that would cut through a character entity
/// are left alone.
pub fn highlight(escaped: &str, query: &str) -> String {
    let needle = escape_html(query.trim());
    if needle.is_empty() {
        return escaped.to_string();
    }

    let entities: Vec<Range<usize>> = entity_pattern()
        .find_iter(escaped)
        .map(|m| m.range())
        .collect();
    let inside = |pos: usize| entities.iter().any(|e| pos > e.start && pos < e.end);

    let mut out = String::with_capacity(escaped.len() + 16);
    let mut last = 0;
    for range in match_ranges(escaped, &needle) {
        if inside(range.start) || inside(range.end) {
            continue;
        }
        out.push_str(&escaped[last..range.start]);
        out.push_str("<mark>");
        out.push_str(&escaped[range.clone()]);
        out.push_str("</mark>");
        last = range.end;
    }
    out.push_str(&escaped[last..]);
    out
}

/// Hostname without a leading `www.`; the raw string if it has none.
pub fn display_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// `Jan 5, 2024`, or `None` when the date is missing or unparseable.
pub fn format_date(created_at: Option<&str>) -> Option<String> {
    created_at
        .and_then(parse_timestamp)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
}

// ============================================================================
// Fragments
// ============================================================================

/// The bookmark list, or an empty-state message.
pub fn render_bookmarks(filtered: &[Bookmark], query: &str) -> String {
    let query = query.trim();
    if filtered.is_empty() {
        return if query.is_empty() {
            "<div class=\"empty-state\"><p>No bookmarks to show.</p></div>\n".to_string()
        } else {
            format!(
                "<div class=\"empty-state\"><p>No bookmarks match &quot;{}&quot;.</p>\
                 <p class=\"hint\">Try a different search or clear the tag filter.</p></div>\n",
                escape_html(query)
            )
        };
    }

    let mut html = String::from("<ol class=\"bookmark-list\">\n");
    for (idx, bookmark) in filtered.iter().enumerate() {
        render_row(&mut html, idx + 1, bookmark, query);
    }
    html.push_str("</ol>\n");
    html
}

fn render_row(html: &mut String, position: usize, bookmark: &Bookmark, query: &str) {
    let url = escape_html(&bookmark.url);
    let title = highlight(&escape_html(&bookmark.title), query);
    let domain = escape_html(&display_domain(&bookmark.url));

    let _ = write!(
        html,
        "<li class=\"bookmark\">\n  <span class=\"bookmark-index\">{position}</span>\n  \
         <div class=\"bookmark-body\">\n    <a class=\"bookmark-title\" href=\"{url}\" \
         target=\"_blank\" rel=\"noopener noreferrer\">{title}</a>\n    \
         <span class=\"bookmark-domain\">{domain}</span>\n"
    );

    if let Some(description) = bookmark.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(
            html,
            "    <p class=\"bookmark-description\">{}</p>",
            highlight(&escape_html(description), query)
        );
    }

    let has_source = bookmark.source.as_deref().is_some_and(|s| !s.is_empty());
    let date = format_date(bookmark.created_at.as_deref());
    if !bookmark.tags.is_empty() || has_source || date.is_some() {
        html.push_str("    <div class=\"bookmark-meta\">\n");
        for tag in &bookmark.tags {
            let tag = escape_html(tag);
            let _ = writeln!(
                html,
                "      <button class=\"tag\" type=\"button\" data-tag=\"{tag}\">{tag}</button>"
            );
        }
        if let Some(source) = bookmark.source.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(
                html,
                "      <span class=\"bookmark-source\">{}</span>",
                escape_html(source)
            );
        }
        if let (Some(label), Some(raw)) = (date, bookmark.created_at.as_deref()) {
            let _ = writeln!(
                html,
                "      <time class=\"bookmark-date\" datetime=\"{}\">{label}</time>",
                escape_html(raw)
            );
        }
        html.push_str("    </div>\n");
    }

    html.push_str("  </div>\n</li>\n");
}

/// "All" chip followed by one chip per tag; the active chip is marked.
pub fn render_tag_bar(tags: &[TagCount], active: Option<&str>) -> String {
    let mut html = String::from("<nav class=\"tag-bar\">\n");
    let _ = writeln!(
        html,
        "  <button class=\"tag{}\" type=\"button\" data-tag=\"\">All</button>",
        if active.is_none() { " active" } else { "" }
    );
    for TagCount { tag, count } in tags {
        let class = if active == Some(tag.as_str()) {
            "tag active"
        } else {
            "tag"
        };
        let tag = escape_html(tag);
        let _ = writeln!(
            html,
            "  <button class=\"{class}\" type=\"button\" data-tag=\"{tag}\">{tag} \
             <span class=\"count\">{count}</span></button>"
        );
    }
    html.push_str("</nav>\n");
    html
}

// ============================================================================
// Page
// ============================================================================

/// A complete, self-contained HTML document for the current view.
pub fn render_page(state: &ViewerState, heading: &str) -> String {
    let heading = escape_html(heading);
    let mut filters = format!(
        "Showing {} of {} bookmarks &middot; sorted by {}",
        state.filtered().len(),
        state.all().len(),
        escape_html(state.sort().label())
    );
    if let Some(tag) = state.active_tag() {
        let _ = write!(filters, " &middot; tag <strong>{}</strong>", escape_html(tag));
    }
    if !state.search_query().is_empty() {
        let _ = write!(
            filters,
            " &middot; search <strong>{}</strong>",
            escape_html(state.search_query())
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta name="referrer" content="no-referrer">
<title>{heading}</title>
<style>{css}</style>
</head>
<body>
<header>
<h1>{heading}</h1>
<p class="summary">{filters}</p>
</header>
{tag_bar}<main>
{list}</main>
</body>
</html>
"#,
        css = CSS,
        tag_bar = render_tag_bar(state.tags(), state.active_tag()),
        list = render_bookmarks(state.filtered(), state.search_query()),
    )
}

/// Minimal embedded stylesheet.
pub const CSS: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; color: #222; }
header h1 { margin-bottom: .25rem; }
.summary { color: #666; margin-top: 0; }
.tag-bar { display: flex; flex-wrap: wrap; gap: .35rem; margin: 1rem 0; }
.tag { border: 1px solid #ccc; background: #f6f6f6; border-radius: 1rem; padding: .1rem .6rem; font-size: .85rem; }
.tag.active { background: #008080; border-color: #008080; color: #fff; }
.count { color: #888; font-size: .75rem; }
.tag.active .count { color: #e0e0e0; }
.bookmark-list { list-style: none; padding: 0; }
.bookmark { display: flex; gap: .75rem; padding: .75rem 0; border-bottom: 1px solid #eee; }
.bookmark-index { color: #aaa; min-width: 2rem; text-align: right; }
.bookmark-title { font-weight: 600; color: #0a5; text-decoration: none; }
.bookmark-domain { color: #888; font-size: .85rem; margin-left: .5rem; }
.bookmark-description { margin: .25rem 0; color: #444; }
.bookmark-meta { display: flex; flex-wrap: wrap; gap: .35rem; align-items: center; font-size: .8rem; color: #888; }
mark { background: #ffe08a; }
.empty-state { text-align: center; color: #888; padding: 3rem 0; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::SortKey;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_highlight_case_insensitive() {
        assert_eq!(
            highlight("Perplexity AI", "perp"),
            "<mark>Perp</mark>lexity AI"
        );
        assert_eq!(highlight("abc", ""), "abc");
    }

    #[test]
    fn test_highlight_runs_on_escaped_text() {
        let escaped = escape_html("Q&A <site>");
        assert_eq!(
            highlight(&escaped, "q&a"),
            "<mark>Q&amp;A</mark> &lt;site&gt;"
        );
    }

    #[test]
    fn test_highlight_never_splits_entities() {
        let escaped = escape_html("Tom & Jerry");
        assert_eq!(highlight(&escaped, "amp"), escaped);
        assert_eq!(highlight(&escaped, "lt"), escaped);
    }

    #[test]
    fn test_highlight_regex_metacharacters() {
        assert_eq!(highlight("C++ (2024)", "(2024)"), "C++ <mark>(2024)</mark>");
    }

    #[test]
    fn test_display_domain() {
        assert_eq!(display_domain("https://www.perplexity.ai"), "perplexity.ai");
        assert_eq!(display_domain("https://docs.rs/regex"), "docs.rs");
        assert_eq!(display_domain("not a url"), "not a url");
        assert_eq!(display_domain("mailto:me@example.com"), "mailto:me@example.com");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date(Some("2024-01-05T10:00:00Z")).as_deref(),
            Some("Jan 5, 2024")
        );
        assert_eq!(format_date(Some("yesterday")), None);
        assert_eq!(format_date(None), None);
    }

    #[test]
    fn test_render_row_contents() {
        let bm = Bookmark::new("Perplexity <AI>", "https://www.perplexity.ai")
            .with_tags(["ai", "search"])
            .with_description("Answer engine")
            .with_source("Chrome")
            .with_created_at("2024-01-05T00:00:00Z");
        let html = render_bookmarks(&[bm], "");
        assert!(html.contains("<span class=\"bookmark-index\">1</span>"));
        assert!(html.contains("Perplexity &lt;AI&gt;"));
        assert!(html.contains("target=\"_blank\" rel=\"noopener noreferrer\""));
        assert!(html.contains(">perplexity.ai</span>"));
        assert!(html.contains("data-tag=\"search\""));
        assert!(html.contains("Answer engine"));
        assert!(html.contains(">Chrome</span>"));
        assert!(html.contains(">Jan 5, 2024</time>"));
        assert!(!html.contains("<AI>"));
    }

    #[test]
    fn test_render_highlights_title_and_description_only() {
        let bm = Bookmark::new("Rust docs", "https://rust.example/rust")
            .with_description("All about rust");
        let html = render_bookmarks(&[bm], "rust");
        assert!(html.contains("<mark>Rust</mark> docs"));
        assert!(html.contains("All about <mark>rust</mark>"));
        assert!(html.contains("href=\"https://rust.example/rust\""));
    }

    #[test]
    fn test_render_omits_missing_optional_fields() {
        let html = render_bookmarks(&[Bookmark::new("Bare", "https://bare.example")], "");
        assert!(!html.contains("bookmark-description"));
        assert!(!html.contains("bookmark-meta"));
    }

    #[test]
    fn test_empty_state_wording() {
        let plain = render_bookmarks(&[], "");
        assert!(plain.contains("No bookmarks to show."));
        let searched = render_bookmarks(&[], "<zzz>");
        assert!(searched.contains("No bookmarks match &quot;&lt;zzz&gt;&quot;."));
    }

    #[test]
    fn test_tag_bar_marks_active() {
        let tags = vec![
            TagCount { tag: "ai".into(), count: 2 },
            TagCount { tag: "news".into(), count: 1 },
        ];
        let html = render_tag_bar(&tags, Some("news"));
        assert!(html.contains("<button class=\"tag\" type=\"button\" data-tag=\"\">All</button>"));
        assert!(html.contains("class=\"tag active\" type=\"button\" data-tag=\"news\""));

        let html = render_tag_bar(&tags, None);
        assert!(html.contains("class=\"tag active\" type=\"button\" data-tag=\"\">All"));
    }

    #[test]
    fn test_render_page() {
        let mut state = ViewerState::new(
            vec![Bookmark::new("One", "https://one.example").with_tags(["x"])],
            SortKey::TitleAsc,
        );
        state.set_active_tag(Some("x".into()));
        let page = render_page(&state, "My <Bookmarks>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>My &lt;Bookmarks&gt;</title>"));
        assert!(page.contains("Showing 1 of 1 bookmarks"));
        assert!(page.contains("tag <strong>x</strong>"));
    }
}
