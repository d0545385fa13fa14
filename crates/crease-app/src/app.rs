// Application orchestrator: owns the tournament and the remote backup, and
// runs the main event loop.
//
// The console feeds parsed commands through `cmd_rx`; every reply goes back
// out through `ui_tx`. Successful changes are saved locally by the engine and
// pushed to the remote backup after a quiet period.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crease_core::document::Document;
use crease_core::roster::Team;
use crease_core::{EngineResult, TournamentState};

use crate::backup::{BackupClient, RemoteBackup};
use crate::command::{UserCommand, HELP};
use crate::sync::SyncScheduler;
use crate::view;

/// What the loop tells the console.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Text(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub tournament: TournamentState,
    backup: Arc<dyn RemoteBackup>,
    sync: SyncScheduler,
    /// Push changes in the background. Off when no backup is configured.
    auto_sync: bool,
}

impl AppState {
    pub fn new(tournament: TournamentState, backup: BackupClient, debounce: Duration) -> Self {
        let auto_sync = backup.is_enabled();
        Self::with_backup(tournament, Arc::new(backup), debounce, auto_sync)
    }

    pub fn with_backup(
        tournament: TournamentState,
        backup: Arc<dyn RemoteBackup>,
        debounce: Duration,
        auto_sync: bool,
    ) -> Self {
        let sync = SyncScheduler::new(Arc::clone(&backup), debounce);
        Self {
            tournament,
            backup,
            sync,
            auto_sync,
        }
    }

    /// Queue a background push of the current tournament.
    fn changed(&mut self) {
        if self.auto_sync {
            self.sync.schedule(self.tournament.document());
        }
    }

    /// Run an engine mutation; on success schedule a push and report `ok`.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut TournamentState) -> EngineResult<T>,
        ok: impl FnOnce(T, &TournamentState) -> String,
    ) -> UiUpdate {
        match op(&mut self.tournament) {
            Ok(value) => {
                self.changed();
                UiUpdate::Text(ok(value, &self.tournament))
            }
            Err(e) => UiUpdate::Error(e.to_string()),
        }
    }

    /// Flush a pending push before exit.
    async fn shutdown(&mut self) {
        if self.sync.has_pending() {
            info!("Flushing pending backup before exit");
            if let Err(e) = self.sync.push_now(&self.tournament.document()).await {
                warn!("Final backup push failed: {:#}", e);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Main application event loop. Runs until `Quit` or the command channel
/// closes, then flushes any pending backup push.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    loop {
        match cmd_rx.recv().await {
            Some(UserCommand::Quit) => {
                info!("Quit command received, shutting down");
                break;
            }
            Some(cmd) => {
                let update = handle_user_command(&mut state, cmd).await;
                if ui_tx.send(update).await.is_err() {
                    info!("Console went away, shutting down");
                    break;
                }
            }
            None => {
                info!("Command channel closed, shutting down");
                break;
            }
        }
    }

    state.shutdown().await;
    Ok(())
}

/// Handle one console command.
pub async fn handle_user_command(state: &mut AppState, cmd: UserCommand) -> UiUpdate {
    debug!("Handling {:?}", cmd);
    match cmd {
        UserCommand::Show => UiUpdate::Text(view::render_overview(&state.tournament)),
        UserCommand::Leaders => UiUpdate::Text(view::render_leaders(state.tournament.roster())),
        UserCommand::Help => UiUpdate::Text(HELP.to_string()),

        UserCommand::Toss {
            match_id,
            team,
            decision,
        } => state.mutate(
            |t| t.set_toss(&match_id, &team, decision),
            |_, _| format!("{} won the toss in {match_id}", Team::name_of(&team)),
        ),
        UserCommand::Start { match_id, innings } => state.mutate(
            |t| t.start_session(&match_id, innings),
            |_, t| session_text(t),
        ),
        UserCommand::Ball(delivery) => state.mutate(
            |t| t.apply_delivery(&delivery),
            |outcome, t| match outcome {
                Some(outcome) => {
                    let mut text = session_text(t);
                    if let Some(note) = view::render_outcome(&outcome) {
                        text = format!("{note}\n{text}");
                    }
                    text
                }
                None => "The innings is over; nothing recorded".to_string(),
            },
        ),
        UserCommand::Bowler(player) => state.mutate(|t| t.set_bowler(&player), |_, t| session_text(t)),
        UserCommand::Second => state.mutate(|t| t.start_second_innings(), |_, t| session_text(t)),
        UserCommand::Finish => state.mutate(
            |t| t.finish_match(),
            |result, t| result_text(&result.winner, t),
        ),
        UserCommand::Abandon => state.mutate(
            |t| t.finish_innings(None),
            |_, _| "Innings abandoned".to_string(),
        ),
        UserCommand::Result {
            match_id,
            winner,
            loser,
        } => state.mutate(
            |t| t.complete_match(&match_id, &winner, &loser, Default::default()),
            |applied, t| {
                if applied {
                    result_text(&winner, t)
                } else {
                    format!("{match_id} already has a result")
                }
            },
        ),
        UserCommand::Quick { match_id, winner } => state.mutate(
            |t| t.quick_win(&match_id, &winner),
            |_, t| result_text(&winner, t),
        ),
        UserCommand::Edit {
            match_id,
            score1,
            score2,
            overs1,
            overs2,
        } => state.mutate(
            |t| t.admin_override(&match_id, score1, score2, overs1, overs2),
            |changed, _| {
                if changed {
                    format!("{match_id} corrected; the result changed and later rounds were updated")
                } else {
                    format!("{match_id} scores corrected")
                }
            },
        ),
        UserCommand::ResetMatch(match_id) => state.mutate(
            |t| t.reset_match(&match_id),
            |_, _| format!("{match_id} reopened"),
        ),
        UserCommand::Rename { team, player, name } => state.mutate(
            |t| t.update_player(&team, &player, Some(&name), None),
            |_, _| format!("{player} is now {name}"),
        ),
        UserCommand::SetRole { team, player, role } => state.mutate(
            |t| t.update_player(&team, &player, None, Some(role)),
            |_, _| format!("{player} is now a {role}"),
        ),

        UserCommand::Export(path) => match export_to(&state.tournament.document(), &path) {
            Ok(()) => UiUpdate::Text(format!("Tournament written to {}", path.display())),
            Err(e) => UiUpdate::Error(format!("{e:#}")),
        },
        UserCommand::Import(path) => match import_from(&path) {
            Ok(doc) => {
                state.tournament.import_document(doc);
                state.changed();
                UiUpdate::Text(format!("Tournament loaded from {}", path.display()))
            }
            Err(e) => UiUpdate::Error(format!("{e:#}")),
        },
        UserCommand::Push => match state.sync.push_now(&state.tournament.document()).await {
            Ok(()) => UiUpdate::Text("Backup pushed".to_string()),
            Err(e) => UiUpdate::Error(format!("{e:#}")),
        },
        UserCommand::Pull => {
            state.sync.cancel();
            match state.backup.pull().await {
                Ok(Some(doc)) => {
                    state.tournament.import_document(doc);
                    UiUpdate::Text("Tournament restored from backup".to_string())
                }
                Ok(None) => UiUpdate::Text("No backup found".to_string()),
                Err(e) => UiUpdate::Error(format!("{e:#}")),
            }
        }
        UserCommand::Status => UiUpdate::Text(status_text(state)),
        UserCommand::HardReset => hard_reset(state).await,

        UserCommand::Quit => UiUpdate::Text(String::new()),
    }
}

/// Wipe the tournament everywhere and start again from the seeded layout.
async fn hard_reset(state: &mut AppState) -> UiUpdate {
    state.sync.cancel();
    let mut problems = Vec::new();
    if let Err(e) = state.backup.delete().await {
        warn!("Failed to delete remote backup: {:#}", e);
        problems.push(format!("remote copy kept ({e})"));
    }
    if let Err(e) = state.tournament.clear_store() {
        warn!("Failed to clear local store: {:#}", e);
        problems.push(format!("local copy kept ({e})"));
    }
    state.tournament.reset_tournament();
    info!("Hard reset complete");
    if problems.is_empty() {
        UiUpdate::Text("Tournament reset".to_string())
    } else {
        UiUpdate::Error(format!("Tournament reset, but {}", problems.join("; ")))
    }
}

fn session_text(t: &TournamentState) -> String {
    match t.session() {
        Some(s) => view::render_session(s, t.roster()),
        None => "No innings in progress".to_string(),
    }
}

fn status_text(state: &AppState) -> String {
    let when = |at: Option<DateTime<Utc>>| match at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".to_string(),
    };
    let mut out = format!("Last saved: {}", when(state.tournament.saved_at()));
    if state.tournament.saves_held() {
        out.push_str(
            "\nSaving is paused: the stored tournament could not be read. \
             Import a file, pull a backup or hard-reset to replace it.",
        );
    }
    let _ = write!(out, "\nLast backup: {}", when(state.sync.last_synced()));
    if !state.auto_sync {
        out.push_str(" (automatic backup off)");
    } else if state.sync.has_pending() {
        out.push_str(" (changes waiting)");
    }
    out
}

fn result_text(winner: &str, t: &TournamentState) -> String {
    let winner = Team::name_of(winner);
    match t.champion() {
        Some(champion) => format!("{winner} won. {} are the champions!", Team::name_of(champion)),
        None => format!("{winner} won"),
    }
}

fn export_to(doc: &Document, path: &Path) -> anyhow::Result<()> {
    let json = doc.to_json()?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn import_from(path: &Path) -> anyhow::Result<Document> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Document::from_json(&json).with_context(|| format!("{} is not a tournament file", path.display()))
}
