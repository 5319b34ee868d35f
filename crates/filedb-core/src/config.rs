//! Application configuration.
//!
//! JSON ファイル（serde）または環境変数から読み込みます。
//!
//! | env                    | field            | default              |
//! |------------------------|------------------|----------------------|
//! | `FILEDB_WORKSPACE`     | workspace_root   | `./workspace`        |
//! | `FILEDB_DATABASE_ROOT` | database_root    | `<workspace>`        |
//! | `FILEDB_CATALOG`       | catalog          | `memory`             |
//! | `FILEDB_MAX_FILES`     | max_files        | unlimited            |
//! | `FILEDB_PERSIST_NOTES` | persist_notes    | `false`              |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::IngestOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Where catalog records live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogConfig {
    #[default]
    Memory,
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scratch directory for upload staging.
    pub workspace_root: PathBuf,

    /// Root under which file databases are created. Defaults to the workspace.
    pub database_root: Option<PathBuf>,

    pub catalog: CatalogConfig,

    /// Maximum number of files allowed to upload.
    pub max_files: Option<usize>,

    pub persist_notes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("workspace"),
            database_root: None,
            catalog: CatalogConfig::Memory,
            max_files: None,
            persist_notes: false,
        }
    }
}

impl AppConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any key lookup (env, tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("FILEDB_WORKSPACE") {
            config.workspace_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("FILEDB_DATABASE_ROOT") {
            config.database_root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FILEDB_CATALOG") {
            config.catalog = match v.as_str() {
                "" | "memory" => CatalogConfig::Memory,
                path => CatalogConfig::Sqlite {
                    path: PathBuf::from(path),
                },
            };
        }
        if let Some(v) = lookup("FILEDB_MAX_FILES") {
            let max = v.parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                var: "FILEDB_MAX_FILES",
                value: v.clone(),
            })?;
            config.max_files = Some(max);
        }
        if let Some(v) = lookup("FILEDB_PERSIST_NOTES") {
            config.persist_notes = match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: "FILEDB_PERSIST_NOTES",
                        value: v,
                    });
                }
            };
        }

        Ok(config)
    }

    pub fn database_root(&self) -> &Path {
        self.database_root
            .as_deref()
            .unwrap_or(self.workspace_root.as_path())
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            max_files: self.max_files,
            persist_notes: self.persist_notes,
        }
    }
}
