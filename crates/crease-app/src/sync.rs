// Debounced background push of the tournament document.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crease_core::document::Document;

use crate::backup::RemoteBackup;

/// Coalesces bursts of changes into a single remote push.
///
/// Each `schedule` call replaces whatever push was waiting, so only the
/// latest document goes out once things have been quiet for `debounce`.
pub struct SyncScheduler {
    backup: Arc<dyn RemoteBackup>,
    debounce: Duration,
    pending: Option<JoinHandle<()>>,
    last_synced: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl SyncScheduler {
    pub fn new(backup: Arc<dyn RemoteBackup>, debounce: Duration) -> Self {
        Self {
            backup,
            debounce,
            pending: None,
            last_synced: Arc::new(Mutex::new(None)),
        }
    }

    /// Push `doc` after the debounce interval unless superseded first.
    pub fn schedule(&mut self, doc: Document) {
        self.cancel();
        let backup = Arc::clone(&self.backup);
        let last_synced = Arc::clone(&self.last_synced);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            match backup.push(&doc).await {
                Ok(()) => {
                    debug!("Background sync complete");
                    *last_synced.lock().expect("sync mutex poisoned") = Some(Utc::now());
                }
                Err(e) => warn!("Background sync failed: {:#}", e),
            }
        }));
    }

    /// Drop any push that is still waiting.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a scheduled push has not gone out yet.
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Push right away, superseding any pending push.
    pub async fn push_now(&mut self, doc: &Document) -> anyhow::Result<()> {
        self.cancel();
        self.backup.push(doc).await?;
        *self.last_synced.lock().expect("sync mutex poisoned") = Some(Utc::now());
        info!("Tournament pushed to remote backup");
        Ok(())
    }

    /// When a push last succeeded.
    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        *self.last_synced.lock().expect("sync mutex poisoned")
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
