//! TOML based configuration.
//!
//! Every file found in [search_paths] is loaded and merged key by key, later files override
//! earlier ones. So a system wide `/etc/tl.toml` can enable git, while a `config.toml` in the
//! working directory points to another database.
//!
//! ```toml
//! [database]
//! directory = "~/timelog"
//!
//! [git]
//! enabled = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::TimelogError,
    utils::dir::{expand_home, user_config_dir},
};

const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 7;
const DEFAULT_COMMIT_MESSAGE: &str = "Autoupdate triggered by tl";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory with the day files. Defaults to `records` inside the state directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Program used for synchronization.
    #[serde(default = "default_git_command")]
    pub command: String,
    /// Limit for a single git invocation, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_message")]
    pub message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_git_command(),
            timeout: default_timeout(),
            message: default_message(),
        }
    }
}

fn default_git_command() -> String {
    "git".into()
}
fn default_timeout() -> u64 {
    DEFAULT_SYNC_TIMEOUT_SECS
}
fn default_message() -> String {
    DEFAULT_COMMIT_MESSAGE.into()
}

/// Application configuration. Built once at startup and handed to whatever needs it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub git: GitConfig,
}

/// Configuration files in the order they are applied.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/etc/tl/config.toml"),
        PathBuf::from("/etc/tl.toml"),
    ];
    if let Some(dir) = user_config_dir() {
        paths.push(dir.join("config.toml"));
    }
    paths.push(PathBuf::from("config.toml"));
    paths
}

impl Config {
    /// Loads every existing file of [search_paths], then `explicit`, which has to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut layers = vec![];
        for path in search_paths() {
            if path.is_file() {
                let content = std::fs::read_to_string(&path)?;
                layers.push((path, content));
            }
        }
        if let Some(path) = explicit {
            let content =
                std::fs::read_to_string(path).map_err(|e| TimelogError::Config {
                    path: path.to_owned(),
                    message: e.to_string(),
                })?;
            layers.push((path.to_owned(), content));
        }
        Self::from_layers(layers)
    }

    /// Merges TOML documents, the last one wins.
    pub fn from_layers(layers: impl IntoIterator<Item = (PathBuf, String)>) -> Result<Self> {
        let mut merged = toml::Table::new();
        let mut last_path = PathBuf::new();
        for (path, content) in layers {
            let table = content
                .parse::<toml::Table>()
                .map_err(|e| TimelogError::Config {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            debug!("Loaded configuration from {path:?}");
            merge_tables(&mut merged, table);
            last_path = path;
        }

        // Type errors can't be attributed to one file after merging, the last one is the
        // best guess.
        let config = toml::Value::Table(merged)
            .try_into::<Config>()
            .map_err(|e| TimelogError::Config {
                path: last_path,
                message: e.to_string(),
            })?;
        Ok(config)
    }

    /// Directory of the day files, `default_root` is used when nothing is configured.
    pub fn database_directory(&self, default_root: &Path) -> PathBuf {
        match &self.database.directory {
            Some(v) => expand_home(v.clone()),
            None => default_root.join("records"),
        }
    }
}

fn merge_tables(target: &mut toml::Table, source: toml::Table) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(table)) => {
                merge_tables(existing, table)
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
