// Crease entry point.
//
// Startup sequence:
// 1. Load config
// 2. Initialize tracing (log to file, not terminal)
// 3. Open the database and restore the saved tournament
// 4. Build the backup client
// 5. Spawn the app loop and the output printer
// 6. Read commands from stdin until quit or EOF

use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use crease_app::app::{self, AppState, UiUpdate};
use crease_app::backup::BackupClient;
use crease_app::command::{self, CommandError};
use crease_app::config;
use crease_core::db::SqliteStore;
use crease_core::TournamentState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing
    init_tracing(&config.log_filter)?;
    info!("Crease starting up");

    // 3. Open database and restore
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let db_path = config.db_path.to_string_lossy().into_owned();
    let store = SqliteStore::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);
    let tournament = TournamentState::load(Box::new(store));

    // 4. Backup client
    let backup = BackupClient::from_config(&config);
    match &backup {
        BackupClient::Active(_) => info!("Remote backup enabled"),
        BackupClient::Disabled => info!("Remote backup disabled (no endpoint or token)"),
    }
    let state = AppState::new(tournament, backup, config.backup.debounce());

    // 5. Channels, app loop and printer
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel::<UiUpdate>(64);
    let ui_echo = ui_tx.clone();

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, state).await {
            error!("Application loop error: {}", e);
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(update) = ui_rx.recv().await {
            match update {
                UiUpdate::Text(text) if text.is_empty() => {}
                UiUpdate::Text(text) => println!("{text}"),
                UiUpdate::Error(e) => eprintln!("error: {e}"),
            }
        }
    });

    println!("crease ready. Type `help` for commands.");

    // 6. Console input
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match command::parse_command(&line) {
            Ok(cmd) => {
                let quit = matches!(cmd, command::UserCommand::Quit);
                if cmd_tx.send(cmd).await.is_err() || quit {
                    break;
                }
            }
            Err(CommandError::Empty) => {}
            Err(e) => {
                let _ = ui_echo.send(UiUpdate::Error(e.to_string())).await;
            }
        }
    }
    drop(cmd_tx);
    drop(ui_echo);

    // Cleanup: let the app flush its backup, then drain output
    let _ = tokio::time::timeout(Duration::from_secs(10), app_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;

    info!("Crease shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file. `RUST_LOG` overrides the configured
/// filter.
fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("crease.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
