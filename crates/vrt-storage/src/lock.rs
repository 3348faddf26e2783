//! Exclusive lock files for read-merge-write cycles

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::error::{Result, StorageError};

/// Locks older than this are assumed to belong to a crashed writer
const STALE_AFTER: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

static NEXT_LOCK: AtomicU64 = AtomicU64::new(0);

/// Held while a writer owns `<file>.lock`; released on drop
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    token: String,
}

impl FileLock {
    pub fn lock_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        target.with_file_name(name)
    }

    /// Acquire the lock guarding `target`, waiting up to `timeout`
    pub fn acquire(target: &Path, timeout: Duration) -> Result<Self> {
        let path = Self::lock_path(target);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let token = new_token();
        let started = Instant::now();
        let mut backoff = Duration::from_millis(10);

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{}", token) {
                        let _ = std::fs::remove_file(&path);
                        return Err(e.into());
                    }
                    debug!("Acquired {}", path.display());
                    return Ok(Self { path, token });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path) && break_stale(&path, &token) {
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(StorageError::LockTimeout(path));
                    }
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        match std::fs::read_to_string(&self.path) {
            Ok(holder) if holder.trim() == self.token => {
                if let Err(e) = std::fs::remove_file(&self.path) {
                    warn!("Failed to release lock {}: {}", self.path.display(), e);
                }
            }
            Ok(_) => warn!(
                "Lock {} was taken over by another writer",
                self.path.display()
            ),
            Err(e) => warn!("Failed to release lock {}: {}", self.path.display(), e),
        }
    }
}

/// `<pid>-<nanos>-<counter>`, unique per acquisition
fn new_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{}-{}-{}",
        std::process::id(),
        nanos,
        NEXT_LOCK.fetch_add(1, Ordering::Relaxed)
    )
}

fn is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_AFTER)
}

/// Move a stale lock aside and delete it. Returns false when another
/// waiter got there first or the file moved aside turns out to be a fresh
/// lock, which is then put back.
fn break_stale(path: &Path, token: &str) -> bool {
    let mut aside = path.as_os_str().to_os_string();
    aside.push(format!(".stale-{}", token));
    let aside = PathBuf::from(aside);

    if std::fs::rename(path, &aside).is_err() {
        return false;
    }

    if is_stale(&aside) {
        warn!("Breaking stale lock {}", path.display());
        let _ = std::fs::remove_file(&aside);
        return true;
    }

    // Only succeeds while nobody holds the lock path
    if let Err(e) = std::fs::hard_link(&aside, path) {
        warn!("Could not restore lock {}: {}", path.display(), e);
    }
    let _ = std::fs::remove_file(&aside);
    false
}
