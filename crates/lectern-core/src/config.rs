//! Configuration types and parsing for lectern.yml

use crate::error::{CoreError, CoreResult};
use crate::layout::AppLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File names probed by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["lectern.yml", "lectern.yaml"];

/// Main project configuration from lectern.yml
///
/// Every field has a default, so an empty file (or no file at all, see
/// [`Config::load_or_default`]) describes the standard layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the database, the auxiliary data, and the index
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Database file name, relative to `data_dir`
    #[serde(default = "default_database")]
    pub database: String,

    /// Auxiliary data directory (uploaded course material), relative to `data_dir`
    #[serde(default = "default_aux_dir")]
    pub aux_dir: String,

    /// Directory receiving pre-migration backups
    #[serde(default = "default_backups_dir")]
    pub backups_dir: String,

    /// Migration lock sentinel, relative to `data_dir`
    #[serde(default = "default_lock_file")]
    pub lock_file: String,

    /// Directory of `NNN_name.sql` migrations. When unset the migrations
    /// embedded in the binary are used.
    #[serde(default)]
    pub migrations_dir: Option<String>,

    /// Expected build configuration of the derived search index
    #[serde(default)]
    pub index: IndexConfig,
}

/// Expected configuration of the derived search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Index directory, relative to `data_dir`
    #[serde(default = "default_index_dir")]
    pub dir: String,

    /// Index format version the application expects
    #[serde(default = "default_index_version")]
    pub version: u32,

    /// Embedding model the index must have been built with
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensionality, when the backend reports one
    #[serde(default)]
    pub embedding_dim: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database: default_database(),
            aux_dir: default_aux_dir(),
            backups_dir: default_backups_dir(),
            lock_file: default_lock_file(),
            migrations_dir: None,
            index: IndexConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            version: default_index_version(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_database() -> String {
    "app.duckdb".to_string()
}

fn default_aux_dir() -> String {
    "subjects".to_string()
}

fn default_backups_dir() -> String {
    "backups".to_string()
}

fn default_lock_file() -> String {
    ".migrate.lock".to_string()
}

fn default_index_dir() -> String {
    "index".to_string()
}

fn default_index_version() -> u32 {
    1
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for lectern.yml or lectern.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
        {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Like [`Config::load_from_dir`], but falls back to the defaults when the
    /// directory has no config file. Parse and validation errors still fail.
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::load_from_dir(dir) {
            Err(CoreError::ConfigNotFound { path }) => {
                log::debug!("No config at {path}, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        let invalid = |message: &str| {
            Err(CoreError::ConfigInvalid {
                message: message.to_string(),
            })
        };

        if self.database.trim().is_empty() {
            return invalid("'database' cannot be empty");
        }
        if self.lock_file.trim().is_empty() {
            return invalid("'lock_file' cannot be empty");
        }
        if self.index.version == 0 {
            return invalid("'index.version' must be at least 1");
        }
        if self.index.embedding_model.trim().is_empty() {
            return invalid("'index.embedding_model' cannot be empty");
        }
        if self.index.embedding_dim == Some(0) {
            return invalid("'index.embedding_dim' must be positive when set");
        }
        Ok(())
    }

    /// Resolve every configured path against the project root
    pub fn layout(&self, root: &Path) -> AppLayout {
        let data_dir = resolve(root, &self.data_dir);
        AppLayout {
            database: resolve(&data_dir, &self.database),
            aux_dir: resolve(&data_dir, &self.aux_dir),
            lock_file: resolve(&data_dir, &self.lock_file),
            index_dir: resolve(&data_dir, &self.index.dir),
            backups_dir: resolve(root, &self.backups_dir),
            migrations_dir: self.migrations_dir.as_deref().map(|d| resolve(root, d)),
            data_dir,
            root: root.to_path_buf(),
        }
    }
}

/// Join `path` onto `base` unless it is already absolute.
fn resolve(base: &Path, path: &str) -> std::path::PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
