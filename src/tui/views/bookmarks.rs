//! Bookmark view: header, search field, tag bar and the bookmark list.
//!
//! Features:
//! - `/` focuses the search field; input is debounced before it filters
//! - `t` focuses the tag bar; chips and inline row tags are clickable
//! - `j`/`k` move the selection, `Enter`/`o` opens the selected bookmark
//! - Search matches are highlighted in titles and descriptions

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use rand::Rng;
use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::core::debounce::Debouncer;
use crate::core::derive::match_ranges;
use crate::core::loader::{LoadError, LoadReport, LoadingFlag};
use crate::core::models::{Bookmark, SortKey};
use crate::core::navigate::{self, Navigator};
use crate::core::render::{display_domain, format_date};
use crate::core::state::ViewerState;
use crate::tui::events::{Action, FocusZone, Notification, NotificationLevel};
use crate::tui::layout::{flow, flow_rows, AppLayout};
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

/// Rows moved by PageUp/PageDown.
const PAGE_STEP: usize = 10;

/// What the view did with an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewResult {
    /// Not handled; global keybindings may apply.
    Ignored,
    Consumed,
    /// Handled, and the app should run this action.
    Execute(Action),
}

/// Clickable regions recorded during the last render.
#[derive(Debug, Default)]
struct HitMap {
    /// Tag bar chips; `None` is the "All" chip.
    chips: Vec<(Rect, Option<String>)>,
    /// Inline tags on bookmark rows.
    row_tags: Vec<(Rect, String)>,
    /// Whole bookmark rows by index into the filtered collection.
    rows: Vec<(Rect, usize)>,
}

impl HitMap {
    fn clear(&mut self) {
        self.chips.clear();
        self.row_tags.clear();
        self.rows.clear();
    }
}

pub struct BookmarksView {
    state: ViewerState,
    /// Raised by the loader task while fetching.
    loading: LoadingFlag,
    load_error: Option<String>,
    search_input: InputBuffer,
    /// Pending search text; its firing is the only writer of the query.
    debouncer: Debouncer<String>,
    focus: FocusZone,
    /// Selected row in the filtered collection.
    selected: usize,
    /// First visible row.
    offset: usize,
    /// Keyboard cursor in the tag bar; 0 is "All".
    tag_cursor: usize,
    hits: HitMap,
    navigator: Box<dyn Navigator>,
}

impl BookmarksView {
    pub fn new(sort: SortKey, search_debounce: Duration, navigator: Box<dyn Navigator>) -> Self {
        Self {
            state: ViewerState::new(Vec::new(), sort),
            loading: LoadingFlag::new(),
            load_error: None,
            search_input: InputBuffer::new(),
            debouncer: Debouncer::new(search_debounce),
            focus: FocusZone::List,
            selected: 0,
            offset: 0,
            tag_cursor: 0,
            hits: HitMap::default(),
            navigator,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn focus(&self) -> FocusZone {
        self.focus
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Handle to the loading indicator, shared with the loader task.
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn selected_bookmark(&self) -> Option<&Bookmark> {
        self.state.filtered().get(self.selected)
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Install the loaded collection, keeping the current sort, tag and query.
    /// Returns a notification for partial or total failure.
    pub fn on_loaded(&mut self, result: Result<LoadReport, LoadError>) -> Option<Notification> {
        match result {
            Ok(report) => {
                let warning = (!report.failures.is_empty()).then(|| {
                    let names: Vec<&str> =
                        report.failures.iter().map(|f| f.name.as_str()).collect();
                    Notification::new(
                        format!("Some sources failed to load: {}", names.join(", ")),
                        NotificationLevel::Warning,
                    )
                });

                let active_tag = self.state.active_tag().map(str::to_string);
                let query = self.state.search_query().to_string();
                self.state = ViewerState::from_report(report, self.state.sort());
                if active_tag.is_some() {
                    self.state.set_active_tag(active_tag);
                }
                if !query.is_empty() {
                    self.state.set_search_query(&query);
                }
                self.load_error = None;
                self.reset_selection();
                warning
            }
            Err(e) => {
                let message = e.to_string();
                log::error!("{message}");
                self.load_error = Some(message.clone());
                Some(Notification::new(message, NotificationLevel::Error))
            }
        }
    }

    /// Apply the debounced search text once its quiet window has passed.
    /// Returns true if the view was re-derived. Call from on_tick.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(query) => {
                self.apply_search(&query);
                true
            }
            None => false,
        }
    }

    fn apply_search(&mut self, query: &str) {
        self.state.set_search_query(query);
        self.reset_selection();
    }

    // ── State mutation ───────────────────────────────────────────────────

    pub fn focus_search(&mut self) {
        self.focus = FocusZone::Search;
    }

    pub fn focus_tags(&mut self) {
        self.sync_tag_cursor();
        self.focus = FocusZone::Tags;
    }

    /// Set or clear the active tag and re-derive.
    pub fn set_tag(&mut self, tag: Option<String>) {
        log::debug!("Active tag: {:?}", tag);
        self.state.set_active_tag(tag);
        self.sync_tag_cursor();
        self.reset_selection();
    }

    pub fn cycle_sort(&mut self, forward: bool) {
        let sort = if forward {
            self.state.sort().next()
        } else {
            self.state.sort().prev()
        };
        self.state.set_sort(sort);
        self.reset_selection();
    }

    /// Open a uniformly random bookmark from the current view.
    /// Returns the opened title, or `None` when the view is empty.
    pub fn random_pick<R: Rng>(&mut self, rng: &mut R) -> io::Result<Option<String>> {
        let filtered = self.state.filtered();
        let Some(picked) = navigate::open_random(filtered, rng, self.navigator.as_mut())? else {
            return Ok(None);
        };
        if let Some(idx) = filtered.iter().position(|b| std::ptr::eq(b, picked)) {
            self.selected = idx;
        }
        Ok(Some(display_title(picked).to_string()))
    }

    /// Open the selected bookmark. Returns the opened title.
    pub fn open_selected(&mut self) -> io::Result<Option<String>> {
        let Some(bookmark) = self.state.filtered().get(self.selected) else {
            return Ok(None);
        };
        navigate::open_bookmark(self.navigator.as_mut(), bookmark)?;
        Ok(Some(display_title(bookmark).to_string()))
    }

    fn reset_selection(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    fn sync_tag_cursor(&mut self) {
        self.tag_cursor = match self.state.active_tag() {
            Some(active) => self
                .state
                .tags()
                .iter()
                .position(|t| t.tag == active)
                .map(|i| i + 1)
                .unwrap_or(0),
            None => 0,
        };
    }

    fn select_next(&mut self, step: usize) {
        let last = self.state.filtered().len().saturating_sub(1);
        self.selected = (self.selected + step).min(last);
    }

    fn select_prev(&mut self, step: usize) {
        self.selected = self.selected.saturating_sub(step);
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event) -> ViewResult {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match self.focus {
                FocusZone::Search => self.handle_search_input(*code, *modifiers),
                FocusZone::Tags => self.handle_tag_input(*code, *modifiers),
                FocusZone::List => self.handle_list_input(*code, *modifiers),
            },
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => ViewResult::Ignored,
        }
    }

    /// While the search field has focus every key except Ctrl+C is consumed,
    /// so single-letter shortcuts type into the field instead.
    fn handle_search_input(&mut self, code: KeyCode, modifiers: KeyModifiers) -> ViewResult {
        if modifiers.contains(KeyModifiers::CONTROL) {
            return match code {
                KeyCode::Char('c') => ViewResult::Ignored,
                KeyCode::Char('u') => {
                    self.search_input.clear();
                    self.schedule_search();
                    ViewResult::Consumed
                }
                _ => ViewResult::Consumed,
            };
        }

        match code {
            KeyCode::Esc | KeyCode::Tab => {
                self.focus = FocusZone::List;
            }
            KeyCode::Enter => {
                // Apply immediately instead of waiting out the window.
                if let Some(query) = self.debouncer.flush() {
                    self.apply_search(&query);
                }
                self.focus = FocusZone::List;
            }
            KeyCode::Char(c) => {
                self.search_input.insert_char(c);
                self.schedule_search();
            }
            KeyCode::Backspace => {
                self.search_input.backspace();
                self.schedule_search();
            }
            KeyCode::Delete => {
                self.search_input.delete();
                self.schedule_search();
            }
            KeyCode::Left => self.search_input.move_left(),
            KeyCode::Right => self.search_input.move_right(),
            KeyCode::Home => self.search_input.move_home(),
            KeyCode::End => self.search_input.move_end(),
            _ => {}
        }
        ViewResult::Consumed
    }

    fn schedule_search(&mut self) {
        self.debouncer
            .schedule(self.search_input.text().to_string(), Instant::now());
    }

    fn handle_tag_input(&mut self, code: KeyCode, modifiers: KeyModifiers) -> ViewResult {
        if !matches!(modifiers, KeyModifiers::NONE | KeyModifiers::SHIFT) {
            return ViewResult::Ignored;
        }
        let chip_count = self.state.tags().len() + 1;
        match code {
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                self.tag_cursor = (self.tag_cursor + chip_count - 1) % chip_count;
                ViewResult::Consumed
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.tag_cursor = (self.tag_cursor + 1) % chip_count;
                ViewResult::Consumed
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let tag = match self.tag_cursor {
                    0 => None,
                    i => self.state.tags().get(i - 1).map(|t| t.tag.clone()),
                };
                ViewResult::Execute(Action::SetTag(tag))
            }
            KeyCode::Esc | KeyCode::Down | KeyCode::Char('j') => {
                self.focus = FocusZone::List;
                ViewResult::Consumed
            }
            _ => ViewResult::Ignored,
        }
    }

    fn handle_list_input(&mut self, code: KeyCode, modifiers: KeyModifiers) -> ViewResult {
        match (modifiers, code) {
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.select_next(1);
                ViewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.select_prev(1);
                ViewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::PageDown) => {
                self.select_next(PAGE_STEP);
                ViewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::PageUp) => {
                self.select_prev(PAGE_STEP);
                ViewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Home) => {
                self.selected = 0;
                ViewResult::Consumed
            }
            (KeyModifiers::SHIFT, KeyCode::Char('G')) | (KeyModifiers::NONE, KeyCode::End) => {
                self.selected = self.state.filtered().len().saturating_sub(1);
                ViewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char('o')) => {
                ViewResult::Execute(Action::OpenSelected)
            }
            (KeyModifiers::NONE, KeyCode::Esc) if self.state.active_tag().is_some() => {
                ViewResult::Execute(Action::SetTag(None))
            }
            _ => ViewResult::Ignored,
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) -> ViewResult {
        let pos = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((_, tag)) = self.hits.chips.iter().find(|(r, _)| r.contains(pos)) {
                    return ViewResult::Execute(Action::SetTag(tag.clone()));
                }
                if let Some((_, tag)) = self.hits.row_tags.iter().find(|(r, _)| r.contains(pos)) {
                    return ViewResult::Execute(Action::SetTag(Some(tag.clone())));
                }
                if let Some(&(_, idx)) = self.hits.rows.iter().find(|(r, _)| r.contains(pos)) {
                    self.selected = idx;
                    self.focus = FocusZone::List;
                    return ViewResult::Consumed;
                }
                ViewResult::Ignored
            }
            MouseEventKind::ScrollDown => {
                self.select_next(1);
                ViewResult::Consumed
            }
            MouseEventKind::ScrollUp => {
                self.select_prev(1);
                ViewResult::Consumed
            }
            _ => ViewResult::Ignored,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Labels of the tag bar chips with their tag; `None` is "All".
    fn chip_labels(&self) -> Vec<(String, Option<String>)> {
        let mut chips = vec![(format!(" All {} ", self.state.all().len()), None)];
        chips.extend(
            self.state
                .tags()
                .iter()
                .map(|t| (format!(" {} {} ", t.tag, t.count), Some(t.tag.clone()))),
        );
        chips
    }

    fn chip_widths(chips: &[(String, Option<String>)]) -> Vec<u16> {
        chips
            .iter()
            .map(|(label, _)| Span::raw(label.as_str()).width() as u16)
            .collect()
    }

    /// Chip rows the tag bar needs at the given outer width.
    pub fn tag_rows(&self, width: u16) -> u16 {
        if self.state.all().is_empty() {
            return 0;
        }
        flow_rows(
            &Self::chip_widths(&self.chip_labels()),
            width.saturating_sub(2),
        )
    }

    pub fn render(&mut self, frame: &mut Frame, layout: &AppLayout) {
        self.hits.clear();
        self.render_header(frame, layout.header);
        self.render_search_bar(frame, layout.search);
        if let Some(tags) = layout.tags {
            self.render_tag_bar(frame, tags);
        }
        self.render_list(frame, layout.main);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" Bookmarks ", theme::title()),
            Span::styled(
                format!(
                    "Showing {} of {} · sorted by {}",
                    self.state.filtered().len(),
                    self.state.all().len(),
                    self.state.sort().label()
                ),
                theme::muted(),
            ),
        ];
        if let Some(tag) = self.state.active_tag() {
            spans.push(Span::styled(" · tag ", theme::muted()));
            spans.push(Span::styled(format!(" {tag} "), theme::chip(true)));
        }
        if self.is_loading() {
            spans.push(Span::styled("  Loading…", Style::default().fg(theme::INFO)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_search_bar(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == FocusZone::Search;
        let block = theme::panel("Search [/]", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text = self.search_input.text();
        let line = if text.is_empty() && !focused {
            Line::from(Span::styled("Press / to search...", theme::dim()))
        } else {
            Line::from(Span::styled(text.to_string(), Style::default().fg(theme::TEXT)))
        };
        frame.render_widget(Paragraph::new(line), inner);

        if focused && inner.width > 0 {
            let col = (self.search_input.cursor_column() as u16).min(inner.width - 1);
            frame.set_cursor_position((inner.x + col, inner.y));
        }
    }

    fn render_tag_bar(&mut self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == FocusZone::Tags;
        let block = theme::panel("Tags [t]", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chips = self.chip_labels();
        let placed = flow(&Self::chip_widths(&chips), inner);
        for (idx, ((label, tag), rect)) in chips.into_iter().zip(placed).enumerate() {
            let Some(rect) = rect else {
                continue;
            };
            let active = match &tag {
                Some(t) => self.state.is_active_tag(t),
                None => self.state.active_tag().is_none(),
            };
            let mut style = theme::chip(active);
            if focused && idx == self.tag_cursor {
                style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
            }
            frame.render_widget(Paragraph::new(Span::styled(label, style)), rect);
            self.hits.chips.push((rect, tag));
        }
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Bookmarks", self.focus == FocusZone::List);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let Some(ref error) = self.load_error {
            let lines = vec![
                Line::raw(""),
                Line::from(Span::styled(
                    format!("  {error}"),
                    Style::default().fg(theme::ERROR).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled("  Restart bmview to retry.", theme::muted())),
            ];
            frame.render_widget(Paragraph::new(lines), inner);
            return;
        }

        if self.is_loading() && self.state.all().is_empty() {
            let loading = Paragraph::new(vec![
                Line::raw(""),
                Line::from(Span::styled("  Loading bookmarks...", theme::muted())),
            ]);
            frame.render_widget(loading, inner);
            return;
        }

        if self.state.filtered().is_empty() {
            frame.render_widget(Paragraph::new(self.empty_state_lines()), inner);
            return;
        }

        let heights: Vec<u16> = self.state.filtered().iter().map(row_height).collect();
        self.selected = self.selected.min(heights.len() - 1);
        self.offset = scroll_offset(&heights, self.offset, self.selected, inner.height);

        let query = self.state.search_query().to_string();
        let number_width = self.state.filtered().len().to_string().len();
        let mut y = inner.y;
        for idx in self.offset..heights.len() {
            if y >= inner.bottom() {
                break;
            }
            let height = heights[idx].min(inner.bottom() - y);
            let rect = Rect::new(inner.x, y, inner.width, height);
            let bookmark = &self.state.filtered()[idx];
            let selected = idx == self.selected;

            let (lines, prefix_width, meta_line) = row_lines(
                bookmark,
                idx + 1,
                number_width,
                selected,
                &query,
                self.state.active_tag(),
            );

            let mut paragraph = Paragraph::new(lines);
            if selected {
                paragraph = paragraph.style(Style::default().bg(theme::BG_SELECTED));
            }
            frame.render_widget(paragraph, rect);

            self.hits.rows.push((rect, idx));
            if let Some(meta) = meta_line {
                let row_y = y + meta;
                if row_y < y + height {
                    let mut x = inner.x + prefix_width;
                    for tag in &bookmark.tags {
                        let w = Span::raw(tag_label(tag)).width() as u16;
                        if x >= inner.right() {
                            break;
                        }
                        let w = w.min(inner.right() - x);
                        self.hits
                            .row_tags
                            .push((Rect::new(x, row_y, w, 1), tag.clone()));
                        x += w + 1;
                    }
                }
            }

            y += height;
        }
    }

    fn empty_state_lines(&self) -> Vec<Line<'static>> {
        let query = self.state.search_query();
        if query.is_empty() && self.state.active_tag().is_none() {
            return vec![
                Line::raw(""),
                Line::from(Span::styled("  No bookmarks to show.", theme::muted())),
            ];
        }
        let headline = if query.is_empty() {
            "  No bookmarks match this tag.".to_string()
        } else {
            format!("  No bookmarks match \"{query}\".")
        };
        vec![
            Line::raw(""),
            Line::from(Span::styled(headline, theme::muted())),
            Line::from(Span::styled(
                "  Try a different search or press Esc to clear the tag filter.",
                theme::dim(),
            )),
        ]
    }
}

// ── Row layout ──────────────────────────────────────────────────────────────

fn display_title(bookmark: &Bookmark) -> &str {
    if bookmark.title.is_empty() {
        &bookmark.url
    } else {
        &bookmark.title
    }
}

fn has_description(bookmark: &Bookmark) -> bool {
    bookmark
        .description
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty())
}

fn has_meta(bookmark: &Bookmark) -> bool {
    !bookmark.tags.is_empty()
        || bookmark.source.as_deref().is_some_and(|s| !s.is_empty())
        || format_date(bookmark.created_at.as_deref()).is_some()
}

/// Terminal rows a bookmark occupies: title, optional description, optional meta.
fn row_height(bookmark: &Bookmark) -> u16 {
    1 + has_description(bookmark) as u16 + has_meta(bookmark) as u16
}

fn tag_label(tag: &str) -> String {
    format!(" #{tag} ")
}

/// Lines for one row, the width of the number prefix, and which line (if
/// any) carries the inline tags. The tag equal to `active_tag` is drawn as
/// an active chip.
fn row_lines(
    bookmark: &Bookmark,
    number: usize,
    number_width: usize,
    selected: bool,
    query: &str,
    active_tag: Option<&str>,
) -> (Vec<Line<'static>>, u16, Option<u16>) {
    let marker = if selected { "▸" } else { " " };
    let prefix = format!("{marker}{number:>number_width$}. ");
    let prefix_width = Span::raw(prefix.as_str()).width() as u16;
    let indent = " ".repeat(prefix_width as usize);

    let title_style = if selected {
        theme::selected_title()
    } else {
        theme::row_title()
    };

    let mut first = vec![Span::styled(prefix, Style::default().fg(theme::CORAL))];
    first.extend(highlighted(display_title(bookmark), query, title_style));
    first.push(Span::raw("  "));
    first.push(Span::styled(display_domain(&bookmark.url), theme::muted()));
    let mut lines = vec![Line::from(first)];

    if has_description(bookmark) {
        let description = bookmark.description.as_deref().unwrap_or_default();
        let mut spans = vec![Span::raw(indent.clone())];
        spans.extend(highlighted(description, query, theme::muted()));
        lines.push(Line::from(spans));
    }

    let mut meta_line = None;
    if has_meta(bookmark) {
        meta_line = Some(lines.len() as u16);
        let mut spans = vec![Span::raw(indent)];
        for tag in &bookmark.tags {
            let active = active_tag == Some(tag.as_str());
            spans.push(Span::styled(tag_label(tag), theme::chip(active)));
            spans.push(Span::raw(" "));
        }
        let mut extras = Vec::new();
        if let Some(source) = bookmark.source.as_deref().filter(|s| !s.is_empty()) {
            extras.push(source.to_string());
        }
        if let Some(date) = format_date(bookmark.created_at.as_deref()) {
            extras.push(date);
        }
        if !extras.is_empty() {
            spans.push(Span::styled(extras.join(" · "), theme::dim()));
        }
        lines.push(Line::from(spans));
    }

    (lines, prefix_width, meta_line)
}

/// Split `text` into spans, marking case-insensitive occurrences of `query`.
fn highlighted(text: &str, query: &str, base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;
    for range in match_ranges(text, query) {
        if range.start > last {
            spans.push(Span::styled(text[last..range.start].to_string(), base));
        }
        spans.push(Span::styled(text[range.clone()].to_string(), theme::mark()));
        last = range.end;
    }
    if last < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last..].to_string(), base));
    }
    spans
}

/// First visible row such that `selected` fits in a viewport of `viewport`
/// rows, scrolling as little as possible from `offset`.
fn scroll_offset(heights: &[u16], offset: usize, selected: usize, viewport: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }
    let selected = selected.min(heights.len() - 1);
    let mut offset = offset.min(selected);
    loop {
        let used: u32 = heights[offset..=selected].iter().map(|&h| u32::from(h)).sum();
        if used <= u32::from(viewport) || offset == selected {
            return offset;
        }
        offset += 1;
    }
}
