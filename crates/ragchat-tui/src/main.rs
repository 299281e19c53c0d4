use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use ragchat_core::Config;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod input;
mod markup;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Terminal chat client for a retrieval-augmented LLM backend")]
struct Cli {
    /// Backend base URL (overrides config and RAGCHAT_BACKEND_URL)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Start with retrieval-augmented answers enabled
    #[arg(long)]
    rag: bool,

    /// Log file (defaults to ragchat.log next to the config file)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {:#}", e);
        Config::new()
    });
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if cli.rag {
        config.use_rag = true;
    }

    let log_path = match cli.log_file {
        Some(path) => path,
        None => Config::get_config_path()?.with_file_name("ragchat.log"),
    };
    init_logging(&log_path)?;
    tracing::info!(backend = %config.base_url(), "starting ragchat");

    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        let reason = format!("{:#}", e);
        tracing::error!(error = %reason, "exiting with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        if let Some(pending) = handler::handle_event(app, event) {
            events.spawn(pending);
        }
    }
    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
