//! Terminal logging and console output.
//!
//! - Structured JSON file logs with daily rotation (tracing-appender)
//! - Diagnostic error reports (miette)
//! - Styled console messages for the one-shot commands (console)
//! - Terminal capability detection

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use console::{style, Term};
use flate2::write::GzEncoder;
use flate2::Compression;
use supports_color::Stream;
use tracing_appender::non_blocking::WorkerGuard;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

/// Rolling log file prefix; daily files are `bmview.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "bmview.log";

const DEFAULT_FILTER: &str = "info";

static TERMINAL_CAPS: OnceLock<TerminalCapabilities> = OnceLock::new();

fn get_terminal_caps() -> &'static TerminalCapabilities {
    TERMINAL_CAPS.get_or_init(TerminalCapabilities::detect)
}

// ============================================================================
// Terminal Capability Detection
// ============================================================================

/// Terminal color support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLevel {
    /// 24-bit TrueColor
    TrueColor,
    /// 256-color palette
    Ansi256,
    /// 16 ANSI colors
    Ansi16,
    NoColor,
}

/// Detected terminal capabilities
#[derive(Debug, Clone)]
pub struct TerminalCapabilities {
    pub color_level: ColorLevel,
    pub supports_unicode: bool,
    pub is_interactive: bool,
    pub width: u16,
}

impl TerminalCapabilities {
    /// Detect terminal capabilities from environment
    pub fn detect() -> Self {
        use is_terminal::IsTerminal;

        let color_level = match supports_color::on(Stream::Stdout) {
            Some(support) if support.has_16m => ColorLevel::TrueColor,
            Some(support) if support.has_256 => ColorLevel::Ansi256,
            Some(support) if support.has_basic => ColorLevel::Ansi16,
            _ => ColorLevel::NoColor,
        };

        let is_interactive = io::stdout().is_terminal();
        let width = Term::stdout().size().1;

        let supports_unicode = std::env::var("TERM")
            .map(|t| !t.contains("dumb"))
            .unwrap_or(true)
            && std::env::var("LANG")
                .map(|l| l.contains("UTF-8") || l.contains("utf8"))
                .unwrap_or(true);

        Self {
            color_level,
            supports_unicode,
            is_interactive,
            width,
        }
    }

    /// Check if colors should be used
    pub fn should_colorize(&self) -> bool {
        self.is_interactive && self.color_level != ColorLevel::NoColor
    }
}

// ============================================================================
// Logging Initialization
// ============================================================================

/// Initialize logging for the one-shot commands (`render`, `convert`).
///
/// Sets up a JSON file layer in `log_dir`, a compact stderr layer, routes
/// `log` macros into `tracing` and installs the miette report hook.
///
/// The returned `WorkerGuard` must stay alive until shutdown so buffered
/// log lines are flushed.
pub fn init(log_dir: &Path) -> WorkerGuard {
    let (file_layer, guard) = file_layer(log_dir);

    // stdout may carry rendered HTML, so console logs go to stderr.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .compact()
        .with_filter(env_filter());

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer);

    finish_init(subscriber, log_dir);
    guard
}

/// Initialize logging for TUI mode.
///
/// Identical to [`init()`] but without a console layer: ratatui owns the
/// terminal in raw/alternate-screen mode, so all logs go to the file only.
pub fn init_tui(log_dir: &Path) -> WorkerGuard {
    let (file_layer, guard) = file_layer(log_dir);

    finish_init(tracing_subscriber::registry().with(file_layer), log_dir);
    guard
}

/// Why the global logging pipeline could not be installed.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already set")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("the log bridge could not be installed: {0}")]
    Bridge(#[from] log::SetLoggerError),
}

/// Make `subscriber` the global default and route `log` macros into it.
///
/// Only one `log` bridge may exist per process; `SubscriberInitExt::init`
/// would install a second one, so the subscriber is set directly.
pub fn install<S>(subscriber: S) -> Result<(), LoggingError>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn file_layer<S>(log_dir: &Path) -> (impl Layer<S>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter());

    (layer, guard)
}

fn finish_init<S>(subscriber: S, log_dir: &Path)
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    if let Err(e) = install(subscriber) {
        eprintln!("Failed to initialize logging: {e}");
    }

    init_miette();

    // Compress after the subscriber is up so the log macros below land somewhere.
    let dir = log_dir.to_path_buf();
    std::thread::spawn(move || {
        compress_old_logs(&dir, &chrono::Local::now().format("%Y-%m-%d").to_string());
    });

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join(LOG_FILE_PREFIX)
    );
}

/// Whether a file in the log directory is a finished log that should be gzipped.
fn should_compress(name: &str, today_suffix: &str) -> bool {
    name.starts_with(&format!("{LOG_FILE_PREFIX}."))
        && !name.ends_with(today_suffix)
        && !name.ends_with(".gz")
}

/// Gzip every rotated log except today's.
fn compress_old_logs(log_dir: &Path, today_suffix: &str) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !should_compress(name, today_suffix) {
            continue;
        }
        match compress_file(&path) {
            Ok(()) => log::info!("Compressed old log: {:?}", path),
            Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
        }
    }
}

fn compress_file(path: &Path) -> io::Result<()> {
    let file = fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);

    let mut gz_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_name.push(".gz");
    let gz_path: PathBuf = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?
        .join(gz_name);

    if gz_path.exists() {
        return Ok(());
    }

    let output = fs::File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(())
}

/// Install the miette report handler, tuned to the detected terminal.
fn init_miette() {
    let caps = get_terminal_caps();

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(caps.color_level == ColorLevel::TrueColor)
                .unicode(caps.supports_unicode)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .color(caps.should_colorize())
                .build(),
        )
    }))
    .ok(); // Ignore if already set
}

// ============================================================================
// Emoji Support
// ============================================================================

/// Convert emoji shortcodes to emoji, e.g. `:bookmark:` -> `🔖`.
pub fn convert_emoji(text: &str) -> String {
    if !get_terminal_caps().supports_unicode {
        return convert_emoji_fallback(text);
    }
    expand_shortcodes(text)
}

fn expand_shortcodes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != ':' {
            result.push(ch);
            continue;
        }

        let mut code = String::new();
        let mut found_end = false;
        while let Some(&next_ch) = chars.peek() {
            if next_ch == ':' {
                chars.next();
                found_end = true;
                break;
            }
            if !next_ch.is_alphanumeric() && next_ch != '_' && next_ch != '-' {
                break;
            }
            code.push(next_ch);
            chars.next();
        }

        if found_end && !code.is_empty() {
            if let Some(emoji) = emojis::get_by_shortcode(&code) {
                result.push_str(emoji.as_str());
                continue;
            }
        }
        // Not a known shortcode; keep the original text.
        result.push(':');
        result.push_str(&code);
        if found_end {
            result.push(':');
        }
    }

    result
}

/// Fallback for terminals without Unicode support
fn convert_emoji_fallback(text: &str) -> String {
    text.replace(":bookmark:", "*")
        .replace(":white_check_mark:", "[v]")
        .replace(":x:", "[x]")
        .replace(":warning:", "[!]")
        .replace(":information_source:", "(i)")
}

// ============================================================================
// Console Output Utilities
// ============================================================================

/// Print a styled panel with title and content
pub fn print_panel(title: &str, content: &str) {
    let caps = get_terminal_caps();
    let width = (caps.width as usize).clamp(20, 80);

    let (h, tl, tr, bl, br, side) = if caps.supports_unicode {
        ("─", "╭", "╮", "╰", "╯", "│")
    } else {
        ("-", "+", "+", "+", "+", "|")
    };

    let title_display = format!(" {} ", title);
    let border_len = width
        .saturating_sub(title_display.chars().count())
        .saturating_sub(2)
        .max(1);
    println!(
        "{}{}{}{}",
        style(tl).cyan(),
        style(&title_display).cyan().bold(),
        style(h.repeat(border_len)).cyan(),
        style(tr).cyan()
    );

    let content_width = width.saturating_sub(4).max(1);
    for line in content.lines() {
        println!(
            "{} {:width$} {}",
            style(side).cyan(),
            line,
            style(side).cyan(),
            width = content_width
        );
    }

    println!(
        "{}{}{}",
        style(bl).cyan(),
        style(h.repeat(width.saturating_sub(2).max(1))).cyan(),
        style(br).cyan()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    let prefix = convert_emoji(":white_check_mark:");
    println!("{} {}", style(prefix).green(), style(message).green());
}

/// Print an error message
pub fn print_error(message: &str) {
    let prefix = convert_emoji(":x:");
    eprintln!("{} {}", style(prefix).red(), style(message).red().bold());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    let prefix = convert_emoji(":warning:");
    eprintln!(
        "{} {}",
        style(prefix).yellow(),
        style(message).yellow().bold()
    );
}

/// Print an info message
pub fn print_info(message: &str) {
    let prefix = convert_emoji(":information_source:");
    println!("{} {}", style(prefix).blue(), style(message).blue());
}

// ============================================================================
// Tests
// ============================================================================
