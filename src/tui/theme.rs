//! Colors and styles for the bookmark viewer.
//!
//! Teal frames and chips, coral for whatever is active or selected, a pale
//! yellow for search matches. Views take styles from here rather than
//! building `Color` values inline.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

pub const TEAL: Color = Color::Rgb(0x00, 0x80, 0x80);
pub const TEAL_LIGHT: Color = Color::Rgb(0x00, 0x96, 0x88);
pub const TEAL_DARK: Color = Color::Rgb(0x00, 0x4D, 0x40);
pub const CORAL: Color = Color::Rgb(0xFF, 0x7F, 0x50);

/// Terminal background the badges cut out of.
pub const BG: Color = Color::Rgb(0x0A, 0x19, 0x19);
/// Selected bookmark row.
pub const BG_SELECTED: Color = Color::Rgb(0x12, 0x26, 0x26);

pub const TEXT: Color = Color::Rgb(0xE0, 0xE0, 0xE0);
pub const TEXT_MUTED: Color = Color::Rgb(0x80, 0x80, 0x80);
pub const TEXT_DIM: Color = Color::Rgb(0x50, 0x50, 0x50);

pub const ERROR: Color = Color::Rgb(0xEF, 0x53, 0x50);
pub const SUCCESS: Color = Color::Rgb(0x66, 0xBB, 0x6A);
pub const WARNING: Color = Color::Rgb(0xFF, 0xA7, 0x26);
pub const INFO: Color = Color::Rgb(0x42, 0xA5, 0xF5);

/// Background of a search match.
pub const MATCH: Color = Color::Rgb(0xFF, 0xE0, 0x82);

/// View title in the header and the help modal.
pub fn title() -> Style {
    Style::default().fg(CORAL).add_modifier(Modifier::BOLD)
}

/// Group headings inside the help modal.
pub fn section() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

/// Key names in the status bar and help modal.
pub fn key() -> Style {
    Style::default().fg(TEAL_LIGHT).add_modifier(Modifier::BOLD)
}

/// Title of the selected bookmark row.
pub fn selected_title() -> Style {
    Style::default().fg(CORAL).add_modifier(Modifier::BOLD)
}

/// Title of an unselected bookmark row.
pub fn row_title() -> Style {
    Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
}

/// Domains, counts, descriptions.
pub fn muted() -> Style {
    Style::default().fg(TEXT_MUTED)
}

/// Placeholders, dates, key-hint separators.
pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Solid badge in the status bar, e.g. the app name or the SEARCH mode.
pub fn badge(fill: Color) -> Style {
    Style::default()
        .fg(BG)
        .bg(fill)
        .add_modifier(Modifier::BOLD)
}

/// A tag chip, in the tag bar or inline on a row. The chip for the active
/// tag (or "All" when no tag is active) is filled coral.
pub fn chip(active: bool) -> Style {
    if active {
        badge(CORAL)
    } else {
        Style::default().fg(TEAL_LIGHT).bg(TEAL_DARK)
    }
}

/// Search match inside titles and descriptions.
pub fn mark() -> Style {
    Style::default().fg(BG).bg(MATCH)
}

/// Bordered panel; the focused panel gets a teal border.
pub fn panel(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(TEAL)
    } else {
        Style::default().fg(TEXT_DIM)
    };
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_chip_is_coral() {
        assert_eq!(chip(true).bg, Some(CORAL));
        assert_eq!(chip(false).bg, Some(TEAL_DARK));
    }

    #[test]
    fn test_mark_differs_from_chips() {
        assert_ne!(mark(), chip(true));
        assert_ne!(mark(), chip(false));
    }

    #[test]
    fn test_row_title_styles_differ() {
        assert_ne!(selected_title(), row_title());
    }
}
