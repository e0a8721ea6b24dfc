//! imshelf - terminal UI for the library holdings manager

mod app;
mod form;
mod mode;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use imshelf_core::{ShelfConfig, ShelfRepository};

use app::App;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log to stderr so the alternate screen stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let data_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => load_config().data_path,
    };
    if let Some(parent) = data_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Open (and possibly recover) the store before the alternate screen
    // starts, so the recovery prompt can use plain stdin/stdout.
    let repo = ShelfRepository::open(&data_path, confirm_on_stdin)?;
    tracing::info!(path = %data_path.display(), "store opened");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run
    let mut app = App::new(repo);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key.code, key.modifiers) {
                return Ok(());
            }
        }
    }
}

/// Read `imshelf/config.toml` from the platform config directory, falling
/// back to defaults when absent or invalid.
fn load_config() -> ShelfConfig {
    let Some(path) = dirs::config_dir().map(|dir| dir.join("imshelf").join("config.toml")) else {
        return ShelfConfig::default();
    };
    match fs::read_to_string(&path) {
        Ok(raw) => ShelfConfig::from_toml(&raw).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "config file is invalid, using defaults");
            ShelfConfig::default()
        }),
        Err(_) => ShelfConfig::default(),
    }
}

/// Blocking stdin yes/no prompt for the corruption-recovery protocol.
fn confirm_on_stdin(message: &str) -> bool {
    let stdin = io::stdin();
    loop {
        print!("{message} (y/n): ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if stdin.read_line(&mut answer).is_err() {
            return false;
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return true,
            "n" | "no" => return false,
            _ => println!("Please respond with 'y' or 'n'."),
        }
    }
}
