//! clubcache - the club website's content in your terminal.
//!
//! Renders officers, history, photo galleries and upcoming events from the
//! club's Google Drive and Calendar, served instantly from a local cache and
//! revalidated in the background.

mod app;
mod ui;
mod utils;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clubcache_core::api::{ApiClient, DriveClient};
use clubcache_core::cache::{CacheManager, CacheStore, FileCacheStore};
use clubcache_core::config::{app_cache_dir, Config};
use clubcache_core::fetcher::{ContentFolders, Fetcher};
use clubcache_core::navigation::Location;
use clubcache_core::{ContentError, CredentialStore, SiteSettings};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "clubcache.log";

const USAGE: &str = "\
Usage: clubcache [OPTIONS]

Options:
  --open <LOCATION>   Start at a page or item, e.g. '#gallery?event=<id>'
  --dump              Fetch all content and print it as JSON
  --clear-cache       Delete cached content and events
  --set-api-key       Store the Google API key in the system keychain
  --forget-api-key    Remove the stored API key
  -h, --help          Print this help";

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run { start: Location },
    Dump,
    ClearCache,
    SetApiKey,
    ForgetApiKey,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut start = Location::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dump" => return Ok(Command::Dump),
            "--clear-cache" => return Ok(Command::ClearCache),
            "--set-api-key" => return Ok(Command::SetApiKey),
            "--forget-api-key" => return Ok(Command::ForgetApiKey),
            "-h" | "--help" => return Ok(Command::Help),
            "--open" => {
                let target = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--open needs a location"))?;
                start = Location::parse(target);
            }
            other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }
    Ok(Command::Run { start })
}

/// Log to stderr for one-shot commands.
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=clubcache_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a file while the terminal UI owns the screen.
fn init_file_tracing() -> Option<WorkerGuard> {
    let log_dir = app_cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        log_dir, LOG_FILE,
    ));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

fn load_settings() -> Result<SiteSettings, ContentError> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    SiteSettings::from_env(&config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let start = match parse_args(&args)? {
        Command::Run { start } => start,
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        command => {
            init_tracing();
            return run_command(command).await;
        }
    };

    let _log_guard = init_file_tracing();
    info!("clubcache starting");

    let mut app = App::new(load_settings(), start)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("clubcache shutting down");
    Ok(())
}

async fn run_command(command: Command) -> Result<()> {
    match command {
        Command::Dump => dump_content().await,
        Command::ClearCache => clear_cache(),
        Command::SetApiKey => {
            let api_key = rpassword::prompt_password("Google API key: ")?;
            let api_key = api_key.trim();
            anyhow::ensure!(!api_key.is_empty(), "No API key entered");
            CredentialStore::store_api_key(api_key)?;
            eprintln!("API key stored in the system keychain.");
            Ok(())
        }
        Command::ForgetApiKey => {
            CredentialStore::delete_api_key()?;
            eprintln!("Stored API key removed.");
            Ok(())
        }
        Command::Run { .. } | Command::Help => Ok(()),
    }
}

/// Fetch everything once and print the snapshot as JSON.
async fn dump_content() -> Result<()> {
    let settings = load_settings()?;
    let api = ApiClient::new(settings.api_key.clone())?;
    let fetcher = Fetcher::new(
        Arc::new(DriveClient::new(api)),
        ContentFolders {
            content: settings.content_folder_id.clone(),
            gallery: settings.gallery_folder_id.clone(),
        },
    );

    eprintln!("Fetching content...");
    let fetched = fetcher.fetch_all().await?;
    eprintln!(
        "Found {} officers, {} links, {} galleries",
        fetched.snapshot.officers.len(),
        fetched.snapshot.links.len(),
        fetched.snapshot.galleries.len()
    );

    let json = serde_json::to_string_pretty(&fetched.snapshot)?;
    println!("{}", json);
    Ok(())
}

fn clear_cache() -> Result<()> {
    let settings = load_settings()?;
    let cache_dir = settings.cache_dir()?;
    let cache = CacheManager::new(cache_dir.clone())?;

    FileCacheStore::new(cache.clone(), settings.cache_expiry).clear()?;
    cache.clear_events().context("Failed to clear events cache")?;
    eprintln!("Cleared cache in {}", cache_dir.display());
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Pick up orchestrator updates and finished background tasks
        app.check_background_tasks();

        // Yield so spawned fetches make progress between frames
        tokio::task::yield_now().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubcache_core::navigation::{Modal, Page};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_default_runs_tui() {
        assert_eq!(
            parse_args(&[]).unwrap(),
            Command::Run { start: Location::default() }
        );
    }

    #[test]
    fn test_parse_args_open_location() {
        let command = parse_args(&args(&["--open", "#gallery?event=abc"])).unwrap();
        let Command::Run { start } = command else {
            panic!("expected Run");
        };
        assert_eq!(start.page, Page::Gallery);
        assert_eq!(start.modal, Some(Modal::Gallery("abc".into())));
    }

    #[test]
    fn test_parse_args_commands() {
        assert_eq!(parse_args(&args(&["--dump"])).unwrap(), Command::Dump);
        assert_eq!(parse_args(&args(&["--clear-cache"])).unwrap(), Command::ClearCache);
        assert_eq!(parse_args(&args(&["--set-api-key"])).unwrap(), Command::SetApiKey);
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--open"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }
}
