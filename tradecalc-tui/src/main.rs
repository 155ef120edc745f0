//! TradeCalc TUI: position sizing, Fib sizing, dip-buy and risk/reward
//! calculators in the terminal.
//!
//! Logs go to a file next to the saved state, never to the terminal.

use std::fs::File;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use tradecalc_core::config::CONFIG_FILE_NAME;
use tradecalc_core::tools::Tool;
use tradecalc_core::AppConfig;
use tradecalc_tui::{input, persistence, ui, App};

#[derive(Parser)]
#[command(name = "tradecalc-tui", about = "TradeCalc calculators in the terminal")]
struct Args {
    /// Link or bare query string to open. Defaults to the last session.
    link: Option<String>,

    /// Path to the TOML config file.
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Log filter for the log file, e.g. `debug`. RUST_LOG wins when set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let config = AppConfig::load(&args.config)?;
    let state_path = persistence::default_path(config.state_path.as_deref());
    init_logging(&state_path, &args.log_level);

    let persisted = persistence::load(&state_path);
    let store = persistence::start_location(args.link.as_deref(), &persisted, &config.base_url);
    let fallback = if args.link.is_some() {
        Tool::PositionSizing
    } else {
        persisted.active_tool
    };
    let mut app = App::new(store, config.defaults.clone(), fallback);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Save state before exit
    if let Err(err) = persistence::save(&state_path, &persistence::extract(&app)) {
        tracing::warn!(path = %state_path.display(), %err, "failed to save state");
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    println!("{}", app.share_url());
    Ok(())
}

/// Write logs to `tradecalc-tui.log` beside the state file. Logging is
/// skipped when the file cannot be created.
fn init_logging(state_path: &Path, level: &str) {
    let Some(dir) = state_path.parent() else {
        return;
    };
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("tradecalc-tui.log")) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Poll for input events (50ms timeout also expires the highlight)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 3. Pick up navigation the keys triggered
        app.after_navigation();

        if !app.running {
            break;
        }
    }
    Ok(())
}
