//! `config.toml` loading and the XDG default locations.
//!
//! Every key is optional; a missing file behaves like an empty one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use veresiye_core::BackupConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VeresiyeConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub backup: BackupSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreSection {
    /// Store file; defaults to `veresiye.db` in the data directory
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSection {
    /// Backup directory; defaults to `backups` in the data directory
    pub directory: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_prefix() -> String {
    BackupConfig::default().prefix
}

fn default_extension() -> String {
    BackupConfig::default().extension
}

fn default_retention_days() -> u32 {
    BackupConfig::default().retention_days
}

impl Default for BackupSection {
    fn default() -> Self {
        Self {
            directory: None,
            prefix: default_prefix(),
            extension: default_extension(),
            retention_days: default_retention_days(),
        }
    }
}

impl VeresiyeConfig {
    /// Backup settings for the core coordinator, with the directory resolved.
    pub fn backup_config(&self) -> anyhow::Result<BackupConfig> {
        let directory = match self.backup.directory.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_backup_dir()?,
        };
        Ok(BackupConfig {
            directory,
            prefix: self.backup.prefix.clone(),
            extension: self.backup.extension.clone(),
            retention_days: self.backup.retention_days,
        })
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("veresiye.db"))
}

pub fn default_backup_dir() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("backups"))
}

pub fn read_config(path: &Path) -> anyhow::Result<VeresiyeConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &VeresiyeConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("veresiye"));
        }
    }
    Ok(home_dir()?.join(".config").join("veresiye"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("veresiye"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("veresiye"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
