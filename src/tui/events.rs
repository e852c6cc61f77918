use crate::core::loader::{LoadError, LoadReport};

/// Events flowing through the Elm-architecture event loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Periodic tick for debouncing, notification TTLs, etc.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// The startup load finished.
    Loaded(Result<LoadReport, LoadError>),
    /// A resolved action to execute.
    Action(Action),
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// High-level actions dispatched by the input mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Focus
    FocusSearch,
    FocusTags,

    // View
    SetTag(Option<String>),
    CycleSort,
    CycleSortBack,
    RandomPick,
    OpenSelected,

    // Modals
    ShowHelp,
    CloseHelp,

    // Application
    Quit,
}

/// Which zone of the bookmark view receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusZone {
    #[default]
    List,
    Search,
    Tags,
}

impl FocusZone {
    pub fn label(self) -> &'static str {
        match self {
            FocusZone::List => "List",
            FocusZone::Search => "Search",
            FocusZone::Tags => "Tags",
        }
    }
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}

impl Notification {
    /// A notification whose id is assigned when it is pushed.
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            id: 0,
            message: message.into(),
            level,
            ttl_ticks: 0,
        }
    }
}
