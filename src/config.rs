//! Admin Configuration
//!
//! Read from a JSON file (`folio_config.json` by default). A missing file
//! means local defaults: a SQLite store next to the binary.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use folio_core::repository::{FirestoreConfig, FirestoreStore, PortfolioStore, SqliteStore, StoreError};

/// Environment variable that overrides the Firestore ID token
pub const ID_TOKEN_ENV: &str = "FOLIO_ID_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("cannot open store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Sqlite { path: PathBuf },
    Firestore(FirestoreConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Sqlite { path: PathBuf::from("folio.db") }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_uploader() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Identity recorded on uploads made from this tool
    #[serde(default = "default_uploader")]
    pub uploaded_by: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            log_dir: default_log_dir(),
            uploaded_by: default_uploader(),
        }
    }
}

impl AdminConfig {
    pub const DEFAULT_PATH: &'static str = "folio_config.json";

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_id_token(std::env::var(ID_TOKEN_ENV).ok());
    }

    fn apply_id_token(&mut self, token: Option<String>) {
        if let (BackendConfig::Firestore(firestore), Some(token)) = (&mut self.backend, token) {
            if !token.is_empty() {
                firestore.id_token = Some(token);
            }
        }
    }

    pub fn open_store(&self) -> Result<Arc<dyn PortfolioStore>, ConfigError> {
        let store: Arc<dyn PortfolioStore> = match &self.backend {
            BackendConfig::Sqlite { path } => Arc::new(SqliteStore::open(path)?),
            BackendConfig::Firestore(firestore) => Arc::new(FirestoreStore::new(firestore.clone())?),
        };
        Ok(store)
    }
}
