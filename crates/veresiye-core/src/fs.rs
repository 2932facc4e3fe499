//! Filesystem utilities for backup copies.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wait applied before the single retry of a failed shared read.
pub const LOCKED_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        // Best-effort replace on platforms where rename fails if target exists.
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Read a whole file without taking an exclusive handle.
///
/// The live store keeps its own connection open while this runs; std opens
/// files with read/write sharing on every platform, so the store is never
/// blocked. A failure other than `NotFound` is retried once after
/// [`LOCKED_RETRY_DELAY`].
pub fn read_shared(path: &Path) -> io::Result<Vec<u8>> {
    match read_once(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(err),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Shared read failed, retrying");
            sleep(LOCKED_RETRY_DELAY);
            read_once(path)
        }
    }
}

fn read_once(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Write bytes to `destination` through a synced temp file in the same directory.
pub fn write_atomic(destination: &Path, data: &[u8]) -> io::Result<()> {
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent)?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("System time error: {}", e)))?
        .as_nanos();
    let temp_path = parent.join(format!(".veresiye-backup-{}.tmp", nanos));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;
    if let Err(err) = file.write_all(data).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    drop(file);

    rename_with_fallback(&temp_path, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rename_new_file() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("temp.txt");
        let dest = dir.path().join("dest.txt");

        File::create(&temp).unwrap().write_all(b"test").unwrap();

        rename_with_fallback(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "test");
    }

    #[test]
    fn test_write_atomic_overwrites_existing() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested").join("copy.db");

        write_atomic(&dest, b"old").unwrap();
        write_atomic(&dest, b"new").unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"new");
        let leftovers: Vec<_> = fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_read_shared_while_file_is_open_for_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("live.db");
        let mut writer = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .unwrap();
        writer.write_all(b"ledger bytes").unwrap();
        writer.flush().unwrap();

        assert_eq!(read_shared(&path).unwrap(), b"ledger bytes");
    }

    #[test]
    fn test_read_shared_missing_file_is_not_retried() {
        let dir = tempdir().unwrap();
        let err = read_shared(&dir.path().join("missing.db")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
