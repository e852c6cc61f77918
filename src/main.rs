use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use miette::{IntoDiagnostic, WrapErr};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use bmview::config::{AppConfig, ConfigError};
use bmview::core::convert::{self, ConvertOptions};
use bmview::core::loader::{LoadError, Loader, LoadingFlag};
use bmview::core::logging;
use bmview::core::models::SortKey;
use bmview::core::navigate::SystemBrowser;
use bmview::core::render::render_page;
use bmview::core::state::ViewerState;
use bmview::tui::app::AppState;
use bmview::tui::events::NotificationLevel;

#[derive(Parser, Debug)]
#[command(name = "bmview", version, about = "Searchable, filterable bookmark viewer")]
struct Cli {
    /// Config file (default: <config dir>/bmview/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal viewer (default)
    Tui,
    /// Render the bookmark list to a standalone HTML page
    Render(RenderArgs),
    /// Convert a Chrome bookmarks export (HTML) into bookmark JSON
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Only include bookmarks carrying this tag
    #[arg(long)]
    tag: Option<String>,
    /// Only include bookmarks matching this search text
    #[arg(long)]
    query: Option<String>,
    /// Sort order: title-asc, title-desc, date-newest, date-oldest, source
    #[arg(long)]
    sort: Option<SortKey>,
    /// Page heading (default: viewer.title from config)
    #[arg(long)]
    title: Option<String>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Chrome bookmarks HTML export
    input: PathBuf,
    /// Value for each bookmark's `source` field
    #[arg(long, default_value = "Chrome Import")]
    source: String,
    /// Output JSON file (single-file mode)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Output directory (default: next to the input)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Write one JSON file per top-level folder
    #[arg(long)]
    split_by_folder: bool,
    /// Skip folders with fewer bookmarks than this when splitting
    #[arg(long, default_value_t = 1)]
    min_bookmarks: usize,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    // Logging is configured from the config, so a config error is held
    // until a logger exists.
    let (config, config_error) = AppConfig::load(cli.config.as_deref());

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_tui(&config, config_error).await,
        Command::Render(args) => {
            let _log_guard = logging::init(&config.log_dir());
            warn_config_fallback(config_error.as_ref());
            run_render(&config, args).await
        }
        Command::Convert(args) => {
            let _log_guard = logging::init(&config.log_dir());
            warn_config_fallback(config_error.as_ref());
            run_convert(args)
        }
    }
}

fn warn_config_fallback(error: Option<&ConfigError>) {
    if let Some(e) = error {
        logging::print_warning(&format!("{e}, using defaults"));
    }
}

async fn run_tui(config: &AppConfig, config_error: Option<ConfigError>) -> miette::Result<()> {
    let _log_guard = logging::init_tui(&config.log_dir());
    log::info!("{} v{} starting", bmview::NAME, bmview::VERSION);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut app = AppState::new(config, event_rx, event_tx, Box::new(SystemBrowser));
    if let Some(e) = config_error {
        log::warn!("{e}, using defaults");
        app.push_notification(
            "Invalid config, using defaults (details in the log)".to_string(),
            NotificationLevel::Warning,
        );
    }
    app.start_loading(Loader::from_config(&config.sources));

    // Setup terminal
    enable_raw_mode().into_diagnostic()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).into_diagnostic()?;
    if config.tui.mouse_enabled {
        execute!(stdout, EnableMouseCapture).into_diagnostic()?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).into_diagnostic()?;

    let result = app
        .run(&mut terminal, config.tick_rate())
        .await;

    // Restore terminal
    disable_raw_mode().into_diagnostic()?;
    if config.tui.mouse_enabled {
        execute!(terminal.backend_mut(), DisableMouseCapture).into_diagnostic()?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen).into_diagnostic()?;
    terminal.show_cursor().into_diagnostic()?;

    log::info!("Shutting down");
    result.into_diagnostic().wrap_err("Terminal UI failed")
}

async fn run_render(config: &AppConfig, args: RenderArgs) -> miette::Result<()> {
    let loader = Loader::from_config(&config.sources);
    let report = match loader.load_all(&LoadingFlag::new()).await {
        Ok(report) => report,
        Err(e) => {
            let LoadError::NoData { failures } = &e;
            for failure in failures {
                logging::print_error(&failure.to_string());
            }
            return Err(e).into_diagnostic();
        }
    };
    for failure in &report.failures {
        logging::print_warning(&format!("Skipped {failure}"));
    }

    let mut state =
        ViewerState::from_report(report, args.sort.unwrap_or(config.viewer.default_sort));
    if args.tag.is_some() {
        state.set_active_tag(args.tag);
    }
    if let Some(query) = args.query.as_deref() {
        state.set_search_query(query);
    }

    let heading = args.title.as_deref().unwrap_or(&config.viewer.title);
    let html = render_page(&state, heading);

    match args.output {
        Some(path) => {
            std::fs::write(&path, html)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            logging::print_success(&format!(
                "Rendered {} of {} bookmarks to {}",
                state.filtered().len(),
                state.all().len(),
                path.display()
            ));
        }
        None => print!("{html}"),
    }
    Ok(())
}

fn run_convert(args: ConvertArgs) -> miette::Result<()> {
    logging::print_info(&format!("Reading {}", args.input.display()));
    let options = ConvertOptions {
        source: args.source,
        output: args.output,
        output_dir: args.output_dir,
        split_by_folder: args.split_by_folder,
        min_bookmarks: args.min_bookmarks,
    };

    let summary = convert::run(&args.input, &options).into_diagnostic()?;

    for file in &summary.written {
        logging::print_success(&format!(
            "Saved {} bookmarks to {}",
            file.count,
            file.path.display()
        ));
    }
    for (folder, count) in &summary.skipped {
        logging::print_warning(&format!(
            "Skipped {folder} ({count} bookmark(s), below --min-bookmarks)"
        ));
    }

    let sample: Vec<&str> = summary.unique_tags.iter().take(10).map(String::as_str).collect();
    let mut body = format!(
        "Bookmarks: {}\nFolders:   {}\nFiles:     {}\nUnique tags: {}",
        summary.total,
        summary.folders,
        summary.written.len(),
        summary.unique_tags.len()
    );
    if !sample.is_empty() {
        body.push_str(&format!("\nSample: {}", sample.join(", ")));
    }
    logging::print_panel(&logging::convert_emoji(":bookmark: Conversion complete"), &body);
    Ok(())
}
