//! Backup, retention and restore of the live store file.
//!
//! Backups are byte-identical copies named
//! `<prefix>_<yyyyMMdd_HHmmss>.<ext>` in local time. Restore never swaps
//! files: it loads the candidate read-only and replaces customer and
//! transaction rows inside one SQLite transaction, leaving settings and
//! quick entries alone. The live file is first copied to
//! `before_restore_<yyyyMMdd_HHmmss>.<ext>` in the backup directory; that copy
//! is not a regular backup and is never listed or pruned.
//!
//! Public operations return reports instead of errors so a front end can
//! show the message as-is.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::fs::{read_shared, write_atomic};
use crate::storage::sqlite::snapshot::{open_read_only, LedgerSnapshot};
use crate::storage::traits::StorageEngine;
use crate::storage::types::Settings;

/// Timestamp embedded in backup file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Prefix of the copy taken just before a restore.
pub const BEFORE_RESTORE_PREFIX: &str = "before_restore";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub extension: String,
    /// Backups older than this many days are pruned; `0` keeps everything
    pub retention_days: u32,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("backups"),
            prefix: "veresiye_backup".to_string(),
            extension: "db".to_string(),
            retention_days: 30,
        }
    }
}

impl BackupConfig {
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn file_name(&self, when: NaiveDateTime) -> String {
        format!(
            "{}_{}.{}",
            self.prefix,
            when.format(TIMESTAMP_FORMAT),
            self.extension
        )
    }

    pub fn before_restore_file_name(&self, when: NaiveDateTime) -> String {
        format!(
            "{}_{}.{}",
            BEFORE_RESTORE_PREFIX,
            when.format(TIMESTAMP_FORMAT),
            self.extension
        )
    }

    /// Recover the timestamp from a file name this config would produce.
    pub fn parse_file_name(&self, name: &str) -> Option<NaiveDateTime> {
        let stamp = name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('_')?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    pub success: bool,
    pub message: String,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub success: bool,
    pub message: String,
    /// Live customers after the restore
    pub customers: usize,
    /// Live transactions after the restore
    pub transactions: usize,
    /// Copy of the live file taken before it was overwritten
    pub before_restore: Option<PathBuf>,
}

impl RestoreReport {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            customers: 0,
            transactions: 0,
            before_restore: None,
        }
    }
}

struct RestoreCounts {
    customers: usize,
    transactions: usize,
    before_restore: PathBuf,
}

/// A backup file found in the backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub created_at: NaiveDateTime,
    pub size: u64,
}

/// A temporary copy of the store prepared for upload.
#[derive(Debug)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl BackupArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Remove the temporary file once the upload is over.
    pub fn discard(self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %err, "Temporary backup not removed");
        }
    }
}

/// Result of handing an artifact to the cloud collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Client id or secret missing from settings
    NotConfigured,
    Completed { file_name: String },
    Failed { reason: Option<String> },
    Error(String),
}

/// Whether settings carry what the cloud collaborator needs.
pub fn cloud_configured(settings: &Settings) -> bool {
    !settings.cloud_client_id.trim().is_empty() && !settings.cloud_client_secret.trim().is_empty()
}

/// User-facing status line for an upload attempt.
pub fn upload_status_message(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::NotConfigured => {
            "Cloud backup is not configured. Set the client id and secret in settings.".to_string()
        }
        UploadOutcome::Completed { file_name } => {
            format!("Backup uploaded. File name: {}", file_name)
        }
        UploadOutcome::Failed { reason } => format!(
            "Upload failed: {}",
            reason.as_deref().unwrap_or("unknown error")
        ),
        UploadOutcome::Error(message) => format!("Error: {}", message),
    }
}

/// Copies, lists, prunes and restores backups of one store.
pub struct BackupCoordinator<'a, S: StorageEngine + ?Sized> {
    storage: &'a S,
    config: BackupConfig,
}

impl<'a, S: StorageEngine + ?Sized> BackupCoordinator<'a, S> {
    pub fn new(storage: &'a S, config: BackupConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Copy the live file into the backup directory, stamped with local time.
    pub fn backup(&self) -> BackupReport {
        self.backup_at(Local::now().naive_local())
    }

    pub fn backup_at(&self, when: NaiveDateTime) -> BackupReport {
        let destination = self.config.directory.join(self.config.file_name(when));
        match self.copy_live_file(&destination) {
            Ok(size) => {
                tracing::info!(path = %destination.display(), bytes = size, "Backup written");
                BackupReport {
                    success: true,
                    message: format!("Backup created: {}", destination.display()),
                    path: Some(destination),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Backup failed");
                BackupReport {
                    success: false,
                    message: format!("Backup failed: {}", err),
                    path: None,
                }
            }
        }
    }

    fn read_live_file(&self) -> Result<Vec<u8>> {
        let source = self.storage.path();
        read_shared(source).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => LedgerError::Io { source: err },
            _ => LedgerError::Busy(format!("{}: {}", source.display(), err)),
        })
    }

    fn copy_live_file(&self, destination: &Path) -> Result<usize> {
        let bytes = self.read_live_file()?;
        write_atomic(destination, &bytes)?;
        Ok(bytes.len())
    }

    /// Write a backup copy into `temp_dir` and return it with its bytes.
    pub fn create_upload_artifact(&self, temp_dir: &Path) -> Result<BackupArtifact> {
        let path = temp_dir.join(self.config.file_name(Local::now().naive_local()));
        let bytes = self.read_live_file()?;
        write_atomic(&path, &bytes)?;
        Ok(BackupArtifact { path, bytes })
    }

    /// Backups in the configured directory, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        let read_dir = match fs::read_dir(&self.config.directory) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(created_at) = self.config.parse_file_name(&name.to_string_lossy()) else {
                continue;
            };
            let metadata = dir_entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(BackupEntry {
                path: dir_entry.path(),
                created_at,
                size: metadata.len(),
            });
        }
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.path.cmp(&a.path)));
        Ok(entries)
    }

    /// Delete backups older than the retention window.
    pub fn prune(&self) -> Result<Vec<PathBuf>> {
        self.prune_before(Local::now().naive_local())
    }

    pub fn prune_before(&self, now: NaiveDateTime) -> Result<Vec<PathBuf>> {
        if self.config.retention_days == 0 {
            return Ok(Vec::new());
        }
        // A window reaching past the earliest representable date prunes nothing.
        let Some(cutoff) =
            now.checked_sub_signed(Duration::days(i64::from(self.config.retention_days)))
        else {
            return Ok(Vec::new());
        };

        let mut removed = Vec::new();
        for entry in self.list_backups()? {
            if entry.created_at < cutoff {
                fs::remove_file(&entry.path)?;
                tracing::info!(path = %entry.path.display(), "Old backup removed");
                removed.push(entry.path);
            }
        }
        Ok(removed)
    }

    /// Check that `path` is a store file without loading it.
    pub fn validate(path: &Path) -> Result<()> {
        open_read_only(path).map(|_| ())
    }

    /// Replace live customers and transactions with those in `path`.
    ///
    /// The candidate is validated and the live file copied aside before
    /// anything changes. Any failure up to that point leaves live data
    /// untouched; a failure inside the replacement rolls back.
    pub fn restore(&self, path: &Path) -> RestoreReport {
        self.restore_at(path, Local::now().naive_local())
    }

    pub fn restore_at(&self, path: &Path, when: NaiveDateTime) -> RestoreReport {
        match self.try_restore(path, when) {
            Ok(counts) => {
                tracing::info!(
                    path = %path.display(),
                    customers = counts.customers,
                    transactions = counts.transactions,
                    before_restore = %counts.before_restore.display(),
                    "Restore completed"
                );
                RestoreReport {
                    success: true,
                    message: format!(
                        "Restored {} customers and {} transactions from {}",
                        counts.customers,
                        counts.transactions,
                        path.display()
                    ),
                    customers: counts.customers,
                    transactions: counts.transactions,
                    before_restore: Some(counts.before_restore),
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Restore failed");
                RestoreReport::failed(format!("Restore failed: {}", err))
            }
        }
    }

    fn try_restore(&self, path: &Path, when: NaiveDateTime) -> Result<RestoreCounts> {
        let snapshot = LedgerSnapshot::load(path)?;
        for customer in &snapshot.customers {
            customer.validated().map_err(|e| {
                LedgerError::Validation(format!("Customer {} in backup: {}", customer.id, e))
            })?;
        }
        for tx in &snapshot.transactions {
            tx.validated().map_err(|e| {
                LedgerError::Validation(format!("Transaction {} in backup: {}", tx.id, e))
            })?;
        }

        let before_restore = self
            .config
            .directory
            .join(self.config.before_restore_file_name(when));
        self.copy_live_file(&before_restore).map_err(|err| {
            LedgerError::Storage(format!(
                "Could not save the current data to {}: {}",
                before_restore.display(),
                err
            ))
        })?;

        self.storage
            .replace_ledger(&snapshot.customers, &snapshot.transactions)?;
        Ok(RestoreCounts {
            customers: snapshot.live_customers().count(),
            transactions: snapshot.live_transactions().count(),
            before_restore,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_file_name_round_trip() {
        let config = BackupConfig::default();
        let name = config.file_name(at(2024, 3, 7));
        assert_eq!(name, "veresiye_backup_20240307_140509.db");
        assert_eq!(config.parse_file_name(&name), Some(at(2024, 3, 7)));
    }

    #[test]
    fn test_before_restore_name_is_not_a_backup() {
        let config = BackupConfig::default();
        let name = config.before_restore_file_name(at(2024, 3, 7));
        assert_eq!(name, "before_restore_20240307_140509.db");
        assert_eq!(config.parse_file_name(&name), None);
    }

    #[test]
    fn test_parse_file_name_rejects_foreign_files() {
        let config = BackupConfig::default();
        assert_eq!(config.parse_file_name("veresiye_backup_latest.db"), None);
        assert_eq!(config.parse_file_name("notes_20240307_140509.db"), None);
        assert_eq!(config.parse_file_name("veresiye_backup_20240307_140509.db3"), None);
    }

    #[test]
    fn test_upload_status_messages() {
        assert!(upload_status_message(&UploadOutcome::NotConfigured).contains("not configured"));
        assert_eq!(
            upload_status_message(&UploadOutcome::Completed {
                file_name: "a.db".to_string()
            }),
            "Backup uploaded. File name: a.db"
        );
        assert_eq!(
            upload_status_message(&UploadOutcome::Failed { reason: None }),
            "Upload failed: unknown error"
        );
    }

    #[test]
    fn test_cloud_configured_needs_both_values() {
        let mut settings = Settings {
            cloud_client_id: "id".to_string(),
            ..Settings::default()
        };
        assert!(!cloud_configured(&settings));
        settings.cloud_client_secret = "secret".to_string();
        assert!(cloud_configured(&settings));
    }
}
