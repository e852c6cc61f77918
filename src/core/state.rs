//! Viewer state controller.
//!
//! Owns the merged collection and the current filter/search/sort inputs.
//! Every mutation goes through a setter that re-derives `filtered`, so the
//! view is always `derive(all, active_tag, search_query, sort)`.

use super::derive::{collect_tags, derive, TagCount};
use super::loader::LoadReport;
use super::merger::merge;
use super::models::{Bookmark, SortKey};

#[derive(Debug, Clone)]
pub struct ViewerState {
    all: Vec<Bookmark>,
    filtered: Vec<Bookmark>,
    tags: Vec<TagCount>,
    active_tag: Option<String>,
    search_query: String,
    sort: SortKey,
}

impl ViewerState {
    pub fn new(all: Vec<Bookmark>, sort: SortKey) -> Self {
        let tags = collect_tags(&all);
        let mut state = Self {
            all,
            filtered: Vec::new(),
            tags,
            active_tag: None,
            search_query: String::new(),
            sort,
        };
        state.refresh();
        state
    }

    /// Merge a successful load into a fresh state.
    pub fn from_report(report: LoadReport, sort: SortKey) -> Self {
        Self::new(merge(report.loaded), sort)
    }

    pub fn all(&self) -> &[Bookmark] {
        &self.all
    }

    pub fn filtered(&self) -> &[Bookmark] {
        &self.filtered
    }

    /// Distinct tags across the whole collection, for the tag bar.
    pub fn tags(&self) -> &[TagCount] {
        &self.tags
    }

    pub fn active_tag(&self) -> Option<&str> {
        self.active_tag.as_deref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn is_active_tag(&self, tag: &str) -> bool {
        self.active_tag.as_deref() == Some(tag)
    }

    /// Set the tag filter; `None` shows everything.
    pub fn set_active_tag(&mut self, tag: Option<String>) {
        self.active_tag = tag;
        self.refresh();
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.trim().to_string();
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.filtered = derive(
            &self.all,
            self.active_tag.as_deref(),
            &self.search_query,
            self.sort,
        );
        log::debug!(
            "Derived {} of {} bookmarks (tag={:?}, query={:?}, sort={})",
            self.filtered.len(),
            self.all.len(),
            self.active_tag,
            self.search_query,
            self.sort
        );
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(Vec::new(), SortKey::default())
    }
}
