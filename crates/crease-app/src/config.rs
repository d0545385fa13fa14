// Configuration loading and parsing (app.toml, credentials.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Resolved location of the SQLite file.
    pub db_path: PathBuf,
    pub backup: BackupConfig,
    pub credentials: CredentialsConfig,
    pub log_filter: String,
}

// ---------------------------------------------------------------------------
// app.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for app.toml.
#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    database: DatabaseSection,
    #[serde(default)]
    backup: BackupConfig,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingSection {
    filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Remote document URL. Backup is off without one.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    2000
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            endpoint: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl BackupConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub backup_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/app.toml` and (optionally)
/// `config/credentials.toml` relative to `base_dir`, without copying
/// defaults.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- app.toml (required) ---
    let app_path = config_dir.join("app.toml");
    let app_text = read_file(&app_path)?;
    let app_file: AppFile = toml::from_str(&app_text).map_err(|e| ConfigError::ParseError {
        path: app_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        db_path: resolve_db_path(&app_file.database.path)?,
        backup: app_file.backup,
        credentials,
        log_filter: app_file.logging.filter,
    };

    validate(&config)?;

    Ok(config)
}

/// Files seeded from `defaults/` on first run. `credentials.toml` is only
/// ever written by hand from its `.example`.
const SEEDED_FILES: [&str; 1] = ["app.toml"];

/// Seed missing files under `config/` from `defaults/`. Returns the files
/// created; an existing file is never touched.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    let mut copied = Vec::new();
    for name in SEEDED_FILES {
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        let source = defaults_dir.join(name);
        if !source.is_file() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!("no {} to create {} from", source.display(), target.display()),
            });
        }
        std::fs::create_dir_all(&config_dir).map_err(|e| seed_error(&config_dir, e))?;
        std::fs::copy(&source, &target).map_err(|e| seed_error(&target, e))?;
        copied.push(target);
    }
    Ok(copied)
}

fn seed_error(path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::DefaultsCopyError {
        message: format!("{}: {e}", path.display()),
    }
}

/// Config for a run from the current directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound { path: path.into() })
}

/// An empty path means "the platform data directory".
fn resolve_db_path(raw: &str) -> Result<PathBuf, ConfigError> {
    let raw = raw.trim();
    if !raw.is_empty() {
        return Ok(PathBuf::from(raw));
    }
    directories::ProjectDirs::from("", "", "crease")
        .map(|dirs| dirs.data_dir().join("crease.db"))
        .ok_or_else(|| ConfigError::ValidationError {
            field: "database.path".into(),
            message: "no platform data directory available; set an explicit path".into(),
        })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.backup.debounce_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "backup.debounce_ms".into(),
            message: "must be greater than 0".into(),
        });
    }

    if let Some(endpoint) = &config.backup.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                field: "backup.endpoint".into(),
                message: format!("must be an http:// or https:// URL, got {endpoint:?}"),
            });
        }
    }

    if let Err(e) = EnvFilter::try_new(&config.log_filter) {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: format!("invalid filter {:?}: {e}", config.log_filter),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
