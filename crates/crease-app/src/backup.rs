// Remote backup of the tournament document over HTTP.
//
// The remote side is a single JSON resource: PUT stores the document, GET
// returns it (404 when nothing is stored), DELETE removes it.

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info};

use crease_core::document::Document;

use crate::config::Config;

/// Somewhere a copy of the tournament can be kept.
#[async_trait]
pub trait RemoteBackup: Send + Sync {
    async fn push(&self, doc: &Document) -> anyhow::Result<()>;

    /// The stored document, or `None` if there isn't one.
    async fn pull(&self) -> anyhow::Result<Option<Document>>;

    async fn delete(&self) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// HttpBackup
// ---------------------------------------------------------------------------

pub struct HttpBackup {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpBackup {
    pub fn new(endpoint: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl RemoteBackup for HttpBackup {
    async fn push(&self, doc: &Document) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "savedAt": Utc::now().to_rfc3339(),
            "document": doc,
        });
        let res = self
            .http
            .put(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("backup push request failed")?;
        if !res.status().is_success() {
            bail!("backup push returned status {}", res.status());
        }
        debug!("Pushed tournament to {}", self.endpoint);
        Ok(())
    }

    async fn pull(&self) -> anyhow::Result<Option<Document>> {
        let res = self
            .http
            .get(&self.endpoint)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("backup pull request failed")?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            bail!("backup pull returned status {}", res.status());
        }
        let body: Value = res.json().await.context("backup body is not JSON")?;
        Ok(Some(unwrap_envelope(body)?))
    }

    async fn delete(&self) -> anyhow::Result<()> {
        let res = self
            .http
            .delete(&self.endpoint)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("backup delete request failed")?;
        match res.status() {
            s if s.is_success() => {
                info!("Deleted remote backup");
                Ok(())
            }
            StatusCode::NOT_FOUND => Ok(()),
            s => bail!("backup delete returned status {s}"),
        }
    }
}

/// Accept both `{"savedAt": .., "document": {..}}` and a bare document.
fn unwrap_envelope(mut body: Value) -> anyhow::Result<Document> {
    let doc = match body.get_mut("document") {
        Some(inner) => inner.take(),
        None => body,
    };
    Document::from_value(doc)
}

// ---------------------------------------------------------------------------
// BackupClient wrapper
// ---------------------------------------------------------------------------

/// Either a configured remote backup or nothing.
pub enum BackupClient {
    Active(HttpBackup),
    /// No endpoint or no token configured.
    Disabled,
}

impl BackupClient {
    /// `Active` when both an endpoint and a non-empty token are configured.
    pub fn from_config(config: &Config) -> Self {
        match (&config.backup.endpoint, &config.credentials.backup_token) {
            (Some(endpoint), Some(token)) if !token.is_empty() => {
                BackupClient::Active(HttpBackup::new(endpoint.clone(), token.clone()))
            }
            _ => BackupClient::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, BackupClient::Active(_))
    }
}

#[async_trait]
impl RemoteBackup for BackupClient {
    async fn push(&self, doc: &Document) -> anyhow::Result<()> {
        match self {
            BackupClient::Active(http) => http.push(doc).await,
            BackupClient::Disabled => bail!("remote backup not configured"),
        }
    }

    async fn pull(&self) -> anyhow::Result<Option<Document>> {
        match self {
            BackupClient::Active(http) => http.pull().await,
            BackupClient::Disabled => bail!("remote backup not configured"),
        }
    }

    /// Nothing to delete when disabled.
    async fn delete(&self) -> anyhow::Result<()> {
        match self {
            BackupClient::Active(http) => http.delete().await,
            BackupClient::Disabled => Ok(()),
        }
    }
}
