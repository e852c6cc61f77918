//! Chrome bookmark export converter.
//!
//! Turns the Netscape-format HTML written by Chrome's "Export bookmarks"
//! into bookmark JSON files the loader can read. Folder names become tags,
//! a few well-known domains contribute extra tags, and the result can be
//! written as one file or one file per top-level folder.
//!
//! Export structure:
//!
//! ```text
//! <DL><p>
//!     <DT><H3>Folder</H3>
//!     <DL><p>
//!         <DT><A HREF="https://..." ADD_DATE="1700000000">Title</A>
//!     </DL><p>
//! </DL><p>
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;
use url::Url;

use super::models::{Bookmark, BookmarkFile};

/// Folder label for bookmarks outside any folder.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Tags never worth keeping; Chrome's own container folders.
const SKIP_TAGS: [&str; 5] = [
    "bookmarks-bar",
    "bookmarks",
    "other-bookmarks",
    "mobile-bookmarks",
    "imported",
];

/// At most this many tags per converted bookmark.
const MAX_TAGS: usize = 5;

/// Domain fragment → tags. The first fragment contained in the host wins.
const DOMAIN_TAGS: &[(&str, &[&str])] = &[
    ("github.com", &["development", "code"]),
    ("stackoverflow.com", &["development", "qa"]),
    ("youtube.com", &["video", "media"]),
    ("twitter.com", &["social"]),
    ("x.com", &["social"]),
    ("reddit.com", &["social", "community"]),
    ("medium.com", &["blog", "articles"]),
    ("dev.to", &["development", "blog"]),
    ("docs.", &["documentation"]),
    ("learn.", &["learning", "tutorial"]),
    ("news.", &["news"]),
];

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No bookmarks found in {0}")]
    NoBookmarks(PathBuf),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

// ============================================================================
// Parsing
// ============================================================================

/// A link as found in the export, before conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBookmark {
    pub title: Option<String>,
    pub url: String,
    pub created_at: Option<String>,
    /// Enclosing folder names, outermost first.
    pub folders: Vec<String>,
}

impl RawBookmark {
    pub fn folder_path(&self) -> String {
        if self.folders.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            self.folders.join("/")
        }
    }

    pub fn top_folder(&self) -> &str {
        self.folders
            .first()
            .map(String::as_str)
            .unwrap_or(UNCATEGORIZED)
    }
}

static TOKEN: OnceLock<Regex> = OnceLock::new();
static ATTR: OnceLock<Regex> = OnceLock::new();
static CHAR_REF: OnceLock<Regex> = OnceLock::new();
static NON_TAG_CHARS: OnceLock<Regex> = OnceLock::new();
static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN.get_or_init(|| {
        Regex::new(
            r#"(?s)<!--.*?-->|<![^>]*>|<(/?)([A-Za-z][A-Za-z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>|([^<]+)"#,
        )
        .expect("token pattern is valid")
    })
}

fn attr_pattern() -> &'static Regex {
    ATTR.get_or_init(|| {
        Regex::new(
            r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#,
        )
        .expect("attribute pattern is valid")
    })
}

fn char_ref_pattern() -> &'static Regex {
    CHAR_REF.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z]+);").expect("char ref pattern is valid")
    })
}

fn non_tag_chars() -> &'static Regex {
    NON_TAG_CHARS.get_or_init(|| Regex::new(r"[^\w\s-]").expect("tag filter pattern is valid"))
}

fn whitespace() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Decode numeric and common named character references.
pub fn decode_entities(text: &str) -> String {
    char_ref_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn parse_attrs(raw: &str) -> IndexMap<String, String> {
    attr_pattern()
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// Chrome's `ADD_DATE` (Unix seconds) as an RFC 3339 UTC timestamp.
fn add_date_to_iso(add_date: &str) -> Option<String> {
    let secs: i64 = add_date.trim().parse().ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[derive(Default)]
struct ExportParser {
    bookmarks: Vec<RawBookmark>,
    folder_stack: Vec<String>,
    current: Option<RawBookmark>,
    in_anchor: bool,
    in_folder_title: bool,
}

impl ExportParser {
    fn start_tag(&mut self, tag: &str, raw_attrs: &str) {
        match tag {
            "h3" => self.in_folder_title = true,
            "a" => {
                self.in_anchor = true;
                let attrs = parse_attrs(raw_attrs);
                self.current = Some(RawBookmark {
                    title: None,
                    url: attrs.get("href").cloned().unwrap_or_default(),
                    created_at: attrs.get("add_date").and_then(|d| add_date_to_iso(d)),
                    folders: self.folder_stack.clone(),
                });
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: &str) {
        match tag {
            "h3" => self.in_folder_title = false,
            "a" => {
                self.in_anchor = false;
                if let Some(bookmark) = self.current.take() {
                    // javascript:, chrome:// and friends are not bookmarks we can show.
                    if bookmark.url.starts_with("http://") || bookmark.url.starts_with("https://") {
                        self.bookmarks.push(bookmark);
                    }
                }
            }
            "dl" => {
                self.folder_stack.pop();
            }
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        let data = decode_entities(raw);
        let data = data.trim();
        if data.is_empty() {
            return;
        }
        if self.in_folder_title {
            self.folder_stack.push(data.to_string());
        } else if self.in_anchor {
            if let Some(bookmark) = self.current.as_mut() {
                bookmark.title = Some(data.to_string());
            }
        }
    }
}

/// Extract every http(s) link from a Chrome bookmark export.
pub fn parse_chrome_bookmarks(html: &str) -> Vec<RawBookmark> {
    let mut parser = ExportParser::default();
    for caps in token_pattern().captures_iter(html) {
        if let Some(name) = caps.get(2) {
            let tag = name.as_str().to_ascii_lowercase();
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            if closing {
                parser.end_tag(&tag);
            } else {
                parser.start_tag(&tag, caps.get(3).map_or("", |m| m.as_str()));
            }
        } else if let Some(text) = caps.get(4) {
            parser.text(text.as_str());
        }
    }
    parser.bookmarks
}

// ============================================================================
// Conversion
// ============================================================================

/// Lowercase, strip punctuation, hyphenate whitespace.
pub fn clean_tag(tag: &str) -> String {
    let lowered = tag.to_lowercase();
    let stripped = non_tag_chars().replace_all(&lowered, "");
    whitespace().replace_all(stripped.trim(), "-").into_owned()
}

/// Host without `www.`, or empty when the URL has no host.
fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.replace("www.", "")))
        .unwrap_or_default()
}

/// Tags implied by well-known domains.
pub fn tags_from_url(url: &str) -> Vec<String> {
    let domain = extract_domain(url);
    if domain.is_empty() {
        return Vec::new();
    }
    DOMAIN_TAGS
        .iter()
        .find(|(pattern, _)| domain.contains(pattern))
        .map(|(_, tags)| tags.iter().map(|t| t.to_string()).collect())
        .unwrap_or_default()
}

/// Convert one raw export entry into a viewer bookmark.
pub fn convert_bookmark(raw: &RawBookmark, source: &str) -> Bookmark {
    let mut seen = HashSet::new();
    let tags: Vec<String> = raw
        .folders
        .iter()
        .filter(|f| !f.is_empty())
        .map(|f| clean_tag(f))
        .chain(tags_from_url(&raw.url))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .filter(|t| !SKIP_TAGS.contains(&t.as_str()))
        .take(MAX_TAGS)
        .collect();

    Bookmark {
        title: raw.title.clone().unwrap_or_else(|| "Untitled".to_string()),
        url: raw.url.clone(),
        tags,
        // Chrome exports carry no descriptions.
        description: Some(String::new()),
        archived: Some(false),
        created_at: raw.created_at.clone(),
        source: Some(source.to_string()),
        source_file: None,
    }
}

/// Group raw bookmarks by their top-level folder, in first-seen order.
pub fn group_by_folder(bookmarks: &[RawBookmark]) -> IndexMap<String, Vec<RawBookmark>> {
    let mut groups: IndexMap<String, Vec<RawBookmark>> = IndexMap::new();
    for bookmark in bookmarks {
        groups
            .entry(bookmark.top_folder().to_string())
            .or_default()
            .push(bookmark.clone());
    }
    groups
}

/// File stem for a folder: lowercase, punctuation stripped, spaces to `_`.
pub fn safe_file_name(folder: &str) -> String {
    let lowered = folder.to_lowercase();
    let stripped = non_tag_chars().replace_all(&lowered, "");
    let name = whitespace().replace_all(stripped.trim(), "_").into_owned();
    if name.is_empty() {
        "uncategorized".to_string()
    } else {
        name
    }
}

// ============================================================================
// Command
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Source label stamped on every bookmark.
    pub source: String,
    /// Single-file output path. Defaults to `<dir>/<input stem>.json`.
    pub output: Option<PathBuf>,
    /// Output directory. Defaults to the input file's directory.
    pub output_dir: Option<PathBuf>,
    pub split_by_folder: bool,
    /// Folders with fewer bookmarks are skipped when splitting.
    pub min_bookmarks: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source: "Chrome Import".to_string(),
            output: None,
            output_dir: None,
            split_by_folder: false,
            min_bookmarks: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ConvertSummary {
    pub total: usize,
    pub folders: usize,
    pub written: Vec<WrittenFile>,
    /// Folders skipped for having fewer than `min_bookmarks` entries.
    pub skipped: Vec<(String, usize)>,
    pub unique_tags: BTreeSet<String>,
}

/// Read `input`, convert it, and write the JSON file(s).
pub fn run(input: &Path, options: &ConvertOptions) -> ConvertResult<ConvertSummary> {
    if !input.exists() {
        return Err(ConvertError::NotFound(input.to_path_buf()));
    }
    log::info!("Reading {}", input.display());
    let html = fs::read_to_string(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let raw = parse_chrome_bookmarks(&html);
    log::info!("Found {} bookmarks", raw.len());
    if raw.is_empty() {
        return Err(ConvertError::NoBookmarks(input.to_path_buf()));
    }

    let converted: Vec<Bookmark> = raw
        .iter()
        .map(|b| convert_bookmark(b, &options.source))
        .collect();

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| input.parent().map(Path::to_path_buf).unwrap_or_default());

    let mut summary = ConvertSummary {
        total: converted.len(),
        unique_tags: converted
            .iter()
            .flat_map(|b| b.tags.iter().cloned())
            .collect(),
        ..ConvertSummary::default()
    };

    if options.split_by_folder {
        let groups = group_by_folder(&raw);
        summary.folders = groups.len();
        for (folder, bookmarks) in groups {
            if bookmarks.len() < options.min_bookmarks {
                log::info!(
                    "Skipping '{folder}' ({} bookmarks < min {})",
                    bookmarks.len(),
                    options.min_bookmarks
                );
                summary.skipped.push((folder, bookmarks.len()));
                continue;
            }
            let file = BookmarkFile {
                items: bookmarks
                    .iter()
                    .map(|b| convert_bookmark(b, &options.source))
                    .collect(),
                title: Some(folder.clone()),
            };
            let path = output_dir.join(format!("{}.json", safe_file_name(&folder)));
            summary.written.push(save_json(&file, &path)?);
        }
    } else {
        let path = options.output.clone().unwrap_or_else(|| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "bookmarks".to_string());
            output_dir.join(format!("{stem}.json"))
        });
        let file = BookmarkFile {
            title: Some(format!("Imported from {}", options.source)),
            items: converted,
        };
        summary.written.push(save_json(&file, &path)?);
    }

    Ok(summary)
}

fn save_json(file: &BookmarkFile, path: &Path) -> ConvertResult<WrittenFile> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConvertError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(file)?;
    fs::write(path, json).map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Saved {} ({} bookmarks)", path.display(), file.items.len());
    Ok(WrittenFile {
        path: path.to_path_buf(),
        count: file.items.len(),
    })
}
