use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use super::events::{Action, AppEvent, FocusZone, Notification, NotificationLevel};
use super::layout::AppLayout;
use super::theme;
use super::views::bookmarks::{BookmarksView, ViewResult};
use crate::config::AppConfig;
use crate::core::loader::Loader;
use crate::core::navigate::Navigator;

/// Ticks a notification stays visible.
const NOTIFICATION_TTL_TICKS: u32 = 100;
/// Maximum notifications shown at once.
const MAX_NOTIFICATIONS: usize = 3;

/// Central application state (Elm architecture).
pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// Bookmark view state.
    pub bookmarks: BookmarksView,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    /// Monotonic counter for notification IDs.
    notification_counter: u64,
    /// Whether the help modal is open.
    pub show_help: bool,
    /// Receiver for backend events.
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Sender handed to background tasks.
    event_tx: mpsc::UnboundedSender<AppEvent>,
    /// Source for random picks.
    rng: StdRng,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        Self {
            running: true,
            bookmarks: BookmarksView::new(
                config.viewer.default_sort,
                config.search_debounce(),
                navigator,
            ),
            notifications: Vec::new(),
            notification_counter: 0,
            show_help: false,
            event_rx,
            event_tx,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fetch all sources in a background task; the result arrives as
    /// [`AppEvent::Loaded`]. The loading indicator is raised before this
    /// returns, so the first frame already shows it.
    pub fn start_loading(&self, loader: Loader) {
        let loading = self.bookmarks.loading_flag().begin();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = loader.load_with(loading).await;
            let _ = tx.send(AppEvent::Loaded(result));
        });
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => {
                // Priority 1: Help modal
                if self.show_help {
                    if let Some(action) = self.map_help_input(&crossterm_event) {
                        self.handle_action(action);
                    }
                    return;
                }

                // Priority 2: Bookmark view (search field swallows shortcuts)
                match self.bookmarks.handle_input(&crossterm_event) {
                    ViewResult::Consumed => return,
                    ViewResult::Execute(action) => {
                        self.handle_action(action);
                        return;
                    }
                    ViewResult::Ignored => {}
                }

                // Priority 3: Global keybindings
                if let Some(action) = self.map_input_to_action(crossterm_event) {
                    self.handle_action(action);
                }
            }
            AppEvent::Action(action) => self.handle_action(action),
            AppEvent::Tick => self.on_tick(),
            AppEvent::Loaded(result) => {
                if let Some(notification) = self.bookmarks.on_loaded(result) {
                    self.push_notification(notification.message, notification.level);
                }
            }
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
            AppEvent::Quit => {
                self.running = false;
            }
        }
    }

    // ── Input mapping ───────────────────────────────────────────────────

    /// Map help modal input to action.
    fn map_help_input(&self, event: &Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };
        match (*modifiers, code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Action::Quit),
            (_, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) => Some(Action::CloseHelp),
            _ => None,
        }
    }

    fn map_input_to_action(&self, event: Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };

        match (modifiers, code) {
            // Ctrl+C → quit, even from the search field
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Action::Quit),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, _) => match code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('?') => Some(Action::ShowHelp),
                KeyCode::Char('/') => Some(Action::FocusSearch),
                KeyCode::Char('t') => Some(Action::FocusTags),
                KeyCode::Char('s') => Some(Action::CycleSort),
                KeyCode::Char('S') => Some(Action::CycleSortBack),
                KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::RandomPick),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::FocusSearch => self.bookmarks.focus_search(),
            Action::FocusTags => self.bookmarks.focus_tags(),
            Action::SetTag(tag) => self.bookmarks.set_tag(tag),
            Action::CycleSort => self.bookmarks.cycle_sort(true),
            Action::CycleSortBack => self.bookmarks.cycle_sort(false),
            Action::RandomPick => {
                let result = self.bookmarks.random_pick(&mut self.rng);
                self.report_open(result);
            }
            Action::OpenSelected => {
                let result = self.bookmarks.open_selected();
                self.report_open(result);
            }
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
        }
    }

    fn report_open(&mut self, result: io::Result<Option<String>>) {
        match result {
            Ok(Some(title)) => {
                self.push_notification(format!("Opened {title}"), NotificationLevel::Info)
            }
            Ok(None) => {}
            Err(e) => self.push_notification(
                format!("Could not open bookmark: {e}"),
                NotificationLevel::Error,
            ),
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        self.notification_counter += 1;
        self.notifications.push(Notification {
            id: self.notification_counter,
            message,
            level,
            ttl_ticks: NOTIFICATION_TTL_TICKS,
        });

        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    /// Tick: decrement notification TTLs, dismiss expired, fire debounced search.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        self.bookmarks.poll(Instant::now());
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let layout = AppLayout::compute(area, self.bookmarks.tag_rows(area.width));

        self.bookmarks.render(frame, &layout);
        self.render_status_bar(frame, layout.status);

        // Overlays
        self.render_notifications(frame, area);

        if self.show_help {
            self.render_help_modal(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let focus = self.bookmarks.focus();
        let mode_indicator = if focus == FocusZone::Search {
            Span::styled(" SEARCH ", theme::badge(theme::TEAL_LIGHT))
        } else {
            Span::raw("")
        };

        let status = Line::from(vec![
            Span::styled(" bmview ", theme::badge(theme::CORAL)),
            Span::raw(" "),
            mode_indicator,
            Span::raw(" "),
            Span::styled(focus.label(), theme::key()),
            Span::raw(" │ "),
            Span::styled("/", theme::key()),
            Span::raw(":search "),
            Span::styled("t", theme::key()),
            Span::raw(":tags "),
            Span::styled("s", theme::key()),
            Span::raw(":sort "),
            Span::styled("r", theme::key()),
            Span::raw(":random "),
            Span::styled("?", theme::key()),
            Span::raw(":help "),
            Span::styled("q", theme::key()),
            Span::raw(":quit"),
        ]);

        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 50u16.min(area.width.saturating_sub(2));
        let height = (self.notifications.len() as u16).min(area.height);
        let x = area.width.saturating_sub(max_width + 1);
        let y = 1u16.min(area.height.saturating_sub(height));

        let notification_area = Rect::new(x, y, max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("ℹ", theme::INFO),
                    NotificationLevel::Success => ("✓", theme::SUCCESS),
                    NotificationLevel::Warning => ("⚠", theme::WARNING),
                    NotificationLevel::Error => ("✗", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(format!(" {prefix} "), Style::default().fg(color).bold()),
                    Span::raw(n.message.as_str()),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(Paragraph::new(lines), notification_area);
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(60, 80, area);

        let keybindings = [
            ("Global:", ""),
            ("q / Ctrl+C", "Quit"),
            ("?", "Toggle this help"),
            ("/", "Focus search"),
            ("t", "Focus tag bar"),
            ("s / S", "Next / previous sort order"),
            ("r / R", "Open a random bookmark from the view"),
            ("", ""),
            ("List:", ""),
            ("j/k, ↓/↑", "Move selection"),
            ("g / G", "First / last bookmark"),
            ("Enter / o", "Open selected bookmark"),
            ("Esc", "Clear tag filter"),
            ("", ""),
            ("Search:", ""),
            ("Enter", "Apply now and return to list"),
            ("Esc", "Return to list"),
            ("Ctrl+U", "Clear search"),
            ("", ""),
            ("Tag bar:", ""),
            ("←/→, h/l", "Move between chips"),
            ("Enter / Space", "Filter by chip (All clears)"),
            ("Esc", "Return to list"),
            ("Mouse", "Click any tag to filter"),
        ];

        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(" Keybindings", theme::title())),
            Line::raw(""),
        ];

        for (key, desc) in &keybindings {
            if key.is_empty() {
                lines.push(Line::raw(""));
            } else if desc.is_empty() {
                lines.push(Line::from(Span::styled(format!("  {key}"), theme::section())));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(format!("{:<18}", key), theme::key()),
                    Span::raw(*desc),
                ]));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  Press "),
            Span::styled("?", theme::key()),
            Span::raw(" or "),
            Span::styled("Esc", theme::key()),
            Span::raw(" to close"),
        ]));

        let block = Block::default()
            .title(" Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::CORAL));

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

/// Calculate a centered rect using percentage of parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::core::loader::{LoadError, LoadReport, LoadedFile, SourceBase};
    use ratatui::backend::TestBackend;
    use crate::core::models::{Bookmark, BookmarkFile, SortKey};

    #[derive(Clone, Default)]
    struct RecordingNavigator(Rc<RefCell<Vec<String>>>);

    impl Navigator for RecordingNavigator {
        fn open(&mut self, url: &str) -> io::Result<()> {
            self.0.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    fn app_with(nav: RecordingNavigator) -> AppState {
        let (tx, rx) = mpsc::unbounded_channel();
        AppState::new(&AppConfig::default(), rx, tx, Box::new(nav))
    }

    fn loaded(app: &mut AppState) {
        let items = vec![
            Bookmark::new("Perplexity AI", "https://www.perplexity.ai").with_tags(["ai"]),
            Bookmark::new("Rust Book", "https://doc.rust-lang.org/book/").with_tags(["rust"]),
        ];
        app.handle_event(AppEvent::Loaded(Ok(LoadReport {
            loaded: vec![LoadedFile {
                name: "a.json".to_string(),
                file: BookmarkFile { title: None, items },
            }],
            failures: vec![],
        })));
    }

    fn press(app: &mut AppState, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(code, modifiers))));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(RecordingNavigator::default());
        press(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(!app.running);

        let mut app = app_with(RecordingNavigator::default());
        press(&mut app, KeyCode::Char('/'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(app.running, "q types into the search field");
        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(!app.running);
    }

    #[test]
    fn test_random_suppressed_while_searching() {
        let nav = RecordingNavigator::default();
        let mut app = app_with(nav.clone());
        loaded(&mut app);

        press(&mut app, KeyCode::Char('/'), KeyModifiers::NONE);
        assert_eq!(app.bookmarks.focus(), FocusZone::Search);
        press(&mut app, KeyCode::Char('r'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert!(nav.0.borrow().is_empty());

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('r'), KeyModifiers::NONE);
        assert_eq!(nav.0.borrow().len(), 1);
        assert_eq!(app.notifications.len(), 1);
    }

    #[test]
    fn test_sort_cycles() {
        let mut app = app_with(RecordingNavigator::default());
        assert_eq!(app.bookmarks.state().sort(), SortKey::DateNewest);
        press(&mut app, KeyCode::Char('s'), KeyModifiers::NONE);
        assert_eq!(app.bookmarks.state().sort(), SortKey::DateNewest.next());
        press(&mut app, KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert_eq!(app.bookmarks.state().sort(), SortKey::DateNewest);
    }

    #[test]
    fn test_load_failure_notifies() {
        let mut app = app_with(RecordingNavigator::default());
        app.handle_event(AppEvent::Loaded(Err(LoadError::NoData { failures: vec![] })));
        assert_eq!(app.notifications.len(), 1);
        assert_eq!(app.notifications[0].level, NotificationLevel::Error);
        assert!(app.bookmarks.load_error().is_some());
    }

    #[test]
    fn test_help_modal_captures_input() {
        let mut app = app_with(RecordingNavigator::default());
        press(&mut app, KeyCode::Char('?'), KeyModifiers::NONE);
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('s'), KeyModifiers::NONE);
        assert_eq!(app.bookmarks.state().sort(), SortKey::DateNewest);
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_notifications_dedup_and_cap() {
        let mut app = app_with(RecordingNavigator::default());
        app.push_notification("same".into(), NotificationLevel::Info);
        app.push_notification("same".into(), NotificationLevel::Info);
        assert_eq!(app.notifications.len(), 1);
        for i in 0..5 {
            app.push_notification(format!("n{i}"), NotificationLevel::Info);
        }
        assert_eq!(app.notifications.len(), MAX_NOTIFICATIONS);
        assert_eq!(app.notifications[0].message, "n2");
    }

    #[test]
    fn test_notifications_expire() {
        let mut app = app_with(RecordingNavigator::default());
        app.push_notification("bye".into(), NotificationLevel::Warning);
        for _ in 0..NOTIFICATION_TTL_TICKS {
            app.handle_event(AppEvent::Tick);
        }
        assert!(app.notifications.is_empty());
    }

    #[test]
    fn test_tag_action_filters() {
        let mut app = app_with(RecordingNavigator::default());
        loaded(&mut app);
        app.handle_event(AppEvent::Action(Action::SetTag(Some("rust".into()))));
        assert_eq!(app.bookmarks.state().filtered().len(), 1);
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.bookmarks.state().filtered().len(), 2);
    }

    #[tokio::test]
    async fn test_loading_indicator_shown_on_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(RecordingNavigator::default());
        app.start_loading(Loader::new(
            SourceBase::Dir(dir.path().to_path_buf()),
            vec!["missing.json".to_string()],
        ));
        assert!(app.bookmarks.is_loading());

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("Loading bookmarks"));
        assert!(!screen.contains("No bookmarks to show"));

        let event = app.event_rx.recv().await.unwrap();
        app.handle_event(event);
        assert!(!app.bookmarks.is_loading());
        assert!(app.bookmarks.load_error().is_some());
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.x + centered.width <= area.width);
        assert!(centered.y + centered.height <= area.height);
    }
}
