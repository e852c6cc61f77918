//! Terminal user interface (ratatui + crossterm, Elm-style event loop).

pub mod app;
pub mod events;
pub mod layout;
pub mod theme;
pub mod views;
pub mod widgets;
