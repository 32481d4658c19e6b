//! Run locking so two scheduled invocations never interleave catalog load/save.
//!
//! The lock file sits beside the catalog (`<catalog>.lock`) and is released
//! when the [`RunLock`] is dropped.

use crate::error::{Result, TripwireError};
use fs4::fs_std::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Holds an exclusive lock for the duration of one run
pub struct RunLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file (for error messages)
    lock_path: PathBuf,
}

impl RunLock {
    /// Lock file path used for a given catalog location
    #[must_use]
    pub fn path_for(catalog_path: &Path) -> PathBuf {
        let mut name = catalog_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "catalog".into());
        name.push(".lock");
        catalog_path.with_file_name(name)
    }

    /// Acquire the run lock for `catalog_path`, waiting up to `timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `Io`: the lock directory cannot be created or the lock file opened
    /// - `Locked`: another run still holds the lock when `timeout` expires
    pub fn acquire(catalog_path: &Path, timeout: Duration) -> Result<Self> {
        let lock_path = Self::path_for(catalog_path);
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| TripwireError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let lock_file = Self::try_acquire_lock(&lock_path, timeout)?;
        Ok(Self {
            lock_file,
            lock_path,
        })
    }

    fn try_acquire_lock(lock_path: &Path, timeout: Duration) -> Result<File> {
        let retry_interval = Duration::from_millis(if cfg!(test) { 10 } else { 100 });
        let start = Instant::now();

        loop {
            let file = fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(lock_path)
                .map_err(|source| TripwireError::Io {
                    path: lock_path.to_path_buf(),
                    source,
                })?;

            match file.try_lock_exclusive() {
                Ok(true) => {
                    use std::io::Write;
                    file.set_len(0).ok();
                    let mut file_ref = &file;
                    let _ = writeln!(
                        file_ref,
                        "pid={}\ntime={}",
                        std::process::id(),
                        humantime::format_rfc3339(SystemTime::now())
                    );
                    return Ok(file);
                }
                Ok(false) | Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(retry_interval);
                }
                Ok(false) | Err(_) => {
                    return Err(TripwireError::Locked {
                        path: lock_path.to_path_buf(),
                    });
                }
            }
        }
    }

    /// Path of the held lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
        // Removing while unlocked could race a waiter; an empty file is harmless.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_sits_beside_catalog() {
        assert_eq!(
            RunLock::path_for(Path::new("/var/lib/tripwire/catalog.bin")),
            PathBuf::from("/var/lib/tripwire/catalog.bin.lock")
        );
    }

    #[test]
    fn test_acquire_and_reacquire_after_drop() {
        let temp = TempDir::new().unwrap();
        let catalog = temp.path().join("catalog.bin");

        let lock = RunLock::acquire(&catalog, Duration::from_millis(50)).unwrap();
        assert!(lock.path().exists());
        drop(lock);

        assert!(RunLock::acquire(&catalog, Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn test_concurrent_lock_fails_after_timeout() {
        let temp = TempDir::new().unwrap();
        let catalog = temp.path().join("catalog.bin");
        let _held = RunLock::acquire(&catalog, Duration::from_millis(50)).unwrap();

        let start = Instant::now();
        let result = RunLock::acquire(&catalog, Duration::from_millis(100));
        assert!(
            matches!(result, Err(TripwireError::Locked { .. })),
            "Second lock acquisition should time out as Locked"
        );
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_uncreatable_lock_directory_is_io_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let result = RunLock::acquire(&blocker.join("catalog.bin"), Duration::from_millis(50));
        match result {
            Err(TripwireError::Io { path, .. }) => assert_eq!(path, blocker),
            Err(other) => panic!("expected Io, got {other}"),
            Ok(_) => panic!("lock under a regular file should fail"),
        }
    }
}
