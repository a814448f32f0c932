//! usradmin-tui binary entry point.
//!
//! Parses the CLI, initializes file logging and the terminal in raw mode,
//! spawns the API worker, runs the TUI event loop, and restores the
//! terminal state on exit.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, mpsc};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod theme;
mod ui;
mod validate;

#[derive(Parser, Debug)]
#[command(name = "usradmin-tui", version, about)]
struct Cli {
    /// Base URL of the user API server.
    #[arg(long, env = "USRADMIN_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Theme preference store.
    #[arg(long, default_value = "theme.conf")]
    theme_file: PathBuf,

    /// Log file (the terminal owns stdout).
    #[arg(long, default_value = "usradmin.log")]
    log_file: PathBuf,

    /// Log filter, e.g. "info" or "usradmin_tui=debug".
    #[arg(long, env = "USRADMIN_LOG", default_value = "info")]
    log_level: String,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("open log file {}", cli.log_file.display()))?;
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    info!(api_url = %cli.api_url, "starting usradmin-tui");

    let (req_tx, req_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker = api::spawn_worker(api::ApiClient::new(cli.api_url.clone()), req_rx, resp_tx);

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, req_tx.clone(), resp_rx, cli.theme_file.clone());

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    // Closing the last sender stops the worker.
    drop(req_tx);
    worker.join().ok();

    if let Err(err) = res {
        eprintln!("application error: {err}");
    }
    Ok(())
}
