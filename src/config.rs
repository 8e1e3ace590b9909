//! Engine configuration loaded from TOML.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_FILE: &str = "data.sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite database file. Falls back to the platform data directory.
    pub database: Option<PathBuf>,
    pub log_level: String,
    pub output_format: OutputFormat,
    pub pretty: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: None,
            log_level: "warn".to_string(),
            output_format: OutputFormat::Json,
            pretty: true,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "hellhbbd", "pagedsql")
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Reads the platform config file if there is one, else the defaults.
    pub fn load_default() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// The configured database, or `<data dir>/data.sqlite`. The parent
    /// directory is created if it does not exist yet.
    pub fn database_path(&self) -> Result<PathBuf> {
        let path = match &self.database {
            Some(path) => path.clone(),
            None => {
                let dirs =
                    project_dirs().ok_or_else(|| anyhow!("unable to resolve data directory"))?;
                dirs.data_local_dir().join(DEFAULT_DB_FILE)
            }
        };
        ensure_parent_dir(&path)?;
        Ok(path)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display())),
        _ => Ok(()),
    }
}
