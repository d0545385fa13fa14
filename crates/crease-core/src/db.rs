// Persistence for the tournament document: the store trait, SQLite and
// in-memory implementations.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::document::Document;

/// Where the tournament document lives between runs.
///
/// Implementations are called synchronously after every successful
/// mutation, so `save` should be quick.
pub trait DocumentStore {
    /// The last saved document, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<Document>>;

    fn save(&self, doc: &Document) -> Result<()>;

    /// Forget the saved document.
    fn clear(&self) -> Result<()>;

    /// When the document was last written, if it has been.
    fn saved_at(&self) -> Result<Option<DateTime<Utc>>>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// SQLite-backed key-value store holding the document as JSON.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    const DOCUMENT_KEY: &'static str = "document";
    const SAVED_AT_KEY: &'static str = "saved_at";

    /// Open (or create) a database at `path`. Pass `":memory:"` for an
    /// ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tournament_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned, which only happens if another thread
    /// panicked mid-query.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn write_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO tournament_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .with_context(|| format!("failed to save {key}"))?;
        Ok(())
    }

    fn read_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM tournament_state WHERE key = ?1")
            .context("failed to prepare state query")?;
        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query tournament state")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read state row")?)),
            None => Ok(None),
        }
    }

}

impl DocumentStore for SqliteStore {
    fn load(&self) -> Result<Option<Document>> {
        match self.read_value(Self::DOCUMENT_KEY)? {
            Some(json) => Ok(Some(Document::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Document and timestamp are written in one transaction.
    fn save(&self, doc: &Document) -> Result<()> {
        let json = serde_json::to_string(doc).context("failed to serialize document")?;
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        Self::write_value(&tx, Self::DOCUMENT_KEY, &json)?;
        Self::write_value(&tx, Self::SAVED_AT_KEY, &Utc::now().to_rfc3339())?;
        tx.commit().context("failed to commit document save")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM tournament_state", [])
            .context("failed to clear tournament state")?;
        Ok(())
    }

    fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.read_value(Self::SAVED_AT_KEY)? else {
            return Ok(None);
        };
        let ts = DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("invalid saved_at timestamp {raw:?}"))?;
        Ok(Some(ts.with_timezone(&Utc)))
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Store that keeps the serialized document in memory. Clones share the
/// same slot, so a test can keep a handle after boxing one into a
/// tournament.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    json: Option<String>,
    saved_at: Option<DateTime<Utc>>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `doc`.
    pub fn with_document(doc: &Document) -> Result<Self> {
        let store = Self::new();
        store.save(doc)?;
        store.lock().saves = 0;
        Ok(store)
    }

    /// A store holding `json` exactly as given, readable or not.
    pub fn with_json(json: impl Into<String>) -> Self {
        let store = Self::new();
        store.lock().json = Some(json.into());
        store
    }

    /// The stored text, byte for byte.
    pub fn raw(&self) -> Option<String> {
        self.lock().json.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemorySlot> {
        self.slot.lock().expect("memory store mutex poisoned")
    }

    /// Number of saves since creation.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<Document>> {
        let json = self.lock().json.clone();
        json.map(|j| Document::from_json(&j)).transpose()
    }

    fn save(&self, doc: &Document) -> Result<()> {
        let json = serde_json::to_string(doc).context("failed to serialize document")?;
        let mut slot = self.lock();
        slot.json = Some(json);
        slot.saved_at = Some(Utc::now());
        slot.saves += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self.lock();
        slot.json = None;
        slot.saved_at = None;
        Ok(())
    }

    fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock().saved_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketGraph, MatchScores};
    use crate::roster::Roster;

    fn test_db() -> SqliteStore {
        SqliteStore::open(":memory:").expect("in-memory database should open")
    }

    fn sample_document() -> Document {
        let mut bracket = BracketGraph::standard();
        bracket
            .complete_match("M2", "D", "C", MatchScores::default())
            .unwrap();
        Document::snapshot(&bracket, &Roster::default(), None)
    }

    #[test]
    fn open_creates_table() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"tournament_state".to_string()));
    }

    #[test]
    fn load_returns_none_when_empty() {
        let db = test_db();
        assert!(db.load().unwrap().is_none());
        assert!(db.saved_at().unwrap().is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let db = test_db();
        let doc = sample_document();
        db.save(&doc).unwrap();
        assert_eq!(db.load().unwrap(), Some(doc));
        assert!(db.saved_at().unwrap().is_some());
    }

    #[test]
    fn save_overwrites_previous_document() {
        let db = test_db();
        db.save(&Document::default()).unwrap();
        let doc = sample_document();
        db.save(&doc).unwrap();
        assert_eq!(db.load().unwrap(), Some(doc));
    }

    #[test]
    fn clear_removes_document() {
        let db = test_db();
        db.save(&sample_document()).unwrap();
        db.clear().unwrap();
        assert!(db.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_row_is_an_error() {
        let db = test_db();
        SqliteStore::write_value(&db.conn(), SqliteStore::DOCUMENT_KEY, "{oops").unwrap();
        assert!(db.load().is_err());
    }

    #[test]
    fn memory_store_shares_state_between_clones() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save(&sample_document()).unwrap();
        assert_eq!(handle.save_count(), 1);
        assert_eq!(handle.load().unwrap(), Some(sample_document()));
        handle.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn memory_store_tracks_saved_at() {
        let store = MemoryStore::new();
        assert!(store.saved_at().unwrap().is_none());
        let before = Utc::now();
        store.save(&sample_document()).unwrap();
        let stamp = store.saved_at().unwrap().unwrap();
        assert!(stamp >= before);
        store.clear().unwrap();
        assert!(store.saved_at().unwrap().is_none());
    }

    #[test]
    fn clear_removes_saved_at() {
        let db = test_db();
        db.save(&sample_document()).unwrap();
        db.clear().unwrap();
        assert!(db.saved_at().unwrap().is_none());
    }

    #[test]
    fn memory_store_with_document_starts_uncounted() {
        let store = MemoryStore::with_document(&sample_document()).unwrap();
        assert_eq!(store.save_count(), 0);
        assert!(store.load().unwrap().is_some());
    }
}
