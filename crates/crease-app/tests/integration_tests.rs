// Integration tests for the console application: typed lines go through the
// command parser and the app loop exactly as they do from stdin.

use std::time::Duration;

use tokio::sync::mpsc;

use crease_app::app::{self, AppState, UiUpdate};
use crease_app::backup::BackupClient;
use crease_app::command::{parse_command, UserCommand};
use crease_app::config;
use crease_core::db::{DocumentStore, MemoryStore};
use crease_core::TournamentState;

// ===========================================================================
// Helpers
// ===========================================================================

fn offline_state(store: &MemoryStore) -> AppState {
    AppState::new(
        TournamentState::new(Box::new(store.clone())),
        BackupClient::Disabled,
        Duration::from_millis(10),
    )
}

/// Feed `script` to a running app loop and collect one reply per line.
async fn run_script(state: AppState, script: &str) -> Vec<UiUpdate> {
    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, state));

    let mut expected = 0;
    for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let cmd = parse_command(line).unwrap_or_else(|e| panic!("{line:?}: {e}"));
        cmd_tx.send(cmd).await.unwrap();
        expected += 1;
    }
    cmd_tx.send(UserCommand::Quit).await.unwrap();
    handle.await.unwrap().unwrap();

    let mut replies = Vec::new();
    while let Ok(update) = ui_rx.try_recv() {
        replies.push(update);
    }
    assert_eq!(replies.len(), expected);
    replies
}

fn last_text(replies: &[UiUpdate]) -> &str {
    match replies.last() {
        Some(UiUpdate::Text(t)) => t,
        other => panic!("expected text, got {other:?}"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn scored_match_from_the_console() {
    let store = MemoryStore::new();
    let mut script = String::from("toss m3 f bowl\nstart m3\n");
    // E: two boundaries, then all out.
    script.push_str("ball 4\nball 6\n");
    for _ in 0..10 {
        script.push_str("ball W bowled\n");
    }
    script.push_str("second\n");
    // F: a wide, a four and a six chase down 11.
    script.push_str("ball WD\nball 4\nball 6\nfinish\nshow\n");

    let replies = run_script(offline_state(&store), &script).await;
    assert!(
        replies.iter().all(|r| matches!(r, UiUpdate::Text(_))),
        "unexpected error in {replies:?}"
    );
    let overview = last_text(&replies);
    assert!(overview.contains("Mars Warriors 10 (2.0) v Mercury Strikers 11 (0.2)"));
    assert!(overview.contains("-> Mercury Strikers won"));

    let saved = store.load().unwrap().unwrap();
    let m3 = &saved.bracket["M3"];
    assert_eq!(m3.winner.as_deref(), Some("F"));
    assert_eq!((m3.score1, m3.score2), (Some(10), Some(11)));
    assert!(saved.scorer.is_none());
}

#[tokio::test]
async fn mistakes_are_reported_and_leave_state_alone() {
    let store = MemoryStore::new();
    let replies = run_script(
        offline_state(&store),
        "quick SF1 A\n\
         toss M1 Z bat\n\
         second\n\
         push",
    )
    .await;

    assert!(replies.iter().all(|r| matches!(r, UiUpdate::Error(_))));
    assert!(matches!(&replies[3], UiUpdate::Error(e) if e.contains("not configured")));
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn corrections_and_renames_show_up_in_leaders() {
    let store = MemoryStore::new();
    let replies = run_script(
        offline_state(&store),
        "toss M1 A bat\n\
         start M1\n\
         ball 6\n\
         ball 6\n\
         ball 6\n\
         ball 6\n\
         ball 6\n\
         rename A A_0 Big Hitter\n\
         leaders",
    )
    .await;

    let leaders = last_text(&replies);
    assert!(leaders.contains("Big Hitter"));
    assert!(leaders.contains("30"));
    assert!(leaders.contains(" *"), "30 runs should mark a hot batter");
}

#[tokio::test]
async fn unreadable_save_survives_a_session() {
    let store = MemoryStore::with_json("{\"bracket\": ");
    let state = AppState::new(
        TournamentState::load(Box::new(store.clone())),
        BackupClient::Disabled,
        Duration::from_millis(10),
    );
    let replies = run_script(state, "quick M1 A\nstatus").await;

    assert!(last_text(&replies).contains("Saving is paused"));
    assert_eq!(store.save_count(), 0);
    assert_eq!(store.raw().as_deref(), Some("{\"bracket\": "));
}

#[test]
fn shipped_defaults_bootstrap_a_config_dir() {
    let tmp = std::env::temp_dir().join(format!("crease_bootstrap_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&tmp);
    std::fs::create_dir_all(tmp.join("defaults")).unwrap();
    let crate_root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    for name in ["app.toml", "credentials.toml.example"] {
        std::fs::copy(crate_root.join("defaults").join(name), tmp.join("defaults").join(name))
            .unwrap();
    }

    let copied = config::ensure_config_files(&tmp).unwrap();
    assert_eq!(copied, vec![tmp.join("config/app.toml")]);
    // Second run copies nothing.
    assert!(config::ensure_config_files(&tmp).unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&tmp);
}
