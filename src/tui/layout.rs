//! Root layout computation: header, search field, tag bar, list, status bar.

use ratatui::layout::{Constraint, Layout, Rect};

/// Tag bar never grows past this many chip rows.
pub const MAX_TAG_ROWS: u16 = 4;
/// Horizontal gap between chips.
pub const CHIP_GAP: u16 = 1;
/// Hide the tag bar entirely below this terminal height.
pub const HIDE_TAGS_THRESHOLD: u16 = 12;

/// Computed layout regions for a single frame.
pub struct AppLayout {
    /// Title and counts (top row).
    pub header: Rect,
    /// Bordered search field.
    pub search: Rect,
    /// Bordered tag bar (None if hidden).
    pub tags: Option<Rect>,
    /// Bookmark list.
    pub main: Rect,
    /// Status bar (bottom row).
    pub status: Rect,
}

impl AppLayout {
    /// Compute layout regions from the terminal area.
    ///
    /// `tag_rows` is the number of chip rows the tag bar wants; it is
    /// clamped to [`MAX_TAG_ROWS`].
    pub fn compute(area: Rect, tag_rows: u16) -> Self {
        let show_tags = area.height >= HIDE_TAGS_THRESHOLD && tag_rows > 0;
        let tag_height = if show_tags {
            tag_rows.min(MAX_TAG_ROWS) + 2
        } else {
            0
        };

        let rows = Layout::vertical([
            Constraint::Length(1),          // Header
            Constraint::Length(3),          // Search field
            Constraint::Length(tag_height), // Tag bar
            Constraint::Min(1),             // List
            Constraint::Length(1),          // Status bar
        ])
        .split(area);

        AppLayout {
            header: rows[0],
            search: rows[1],
            tags: show_tags.then_some(rows[2]),
            main: rows[3],
            status: rows[4],
        }
    }
}

/// Number of rows needed to flow chips of `widths` into `width` columns.
pub fn flow_rows(widths: &[u16], width: u16) -> u16 {
    if widths.is_empty() || width == 0 {
        return 0;
    }
    let mut rows = 1;
    let mut x = 0u16;
    for &w in widths {
        let w = w.min(width);
        if x > 0 && x + w > width {
            rows += 1;
            x = 0;
        }
        x += w + CHIP_GAP;
    }
    rows
}

/// Place chips left-to-right, wrapping at the right edge of `area`.
/// Chips that fall below the bottom of `area` get `None`.
pub fn flow(widths: &[u16], area: Rect) -> Vec<Option<Rect>> {
    let mut placed = Vec::with_capacity(widths.len());
    let mut x = 0u16;
    let mut y = 0u16;
    for &w in widths {
        let w = w.min(area.width);
        if x > 0 && x + w > area.width {
            y += 1;
            x = 0;
        }
        if y >= area.height || w == 0 {
            placed.push(None);
        } else {
            placed.push(Some(Rect::new(area.x + x, area.y + y, w, 1)));
        }
        x = x.saturating_add(w + CHIP_GAP);
    }
    placed
}
