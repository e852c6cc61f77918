/// bmview - Bookmark viewer (TUI Edition)
///
/// Core library providing bookmark loading, merging, filtering and
/// rendering, plus a Chrome bookmark export converter.

pub mod config;
pub mod core;
pub mod tui;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
