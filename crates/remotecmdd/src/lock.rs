//! Advisory file lock guarding resources shared between processes.
//!
//! A lock is held while its file exists. Acquisition creates the file with
//! `create_new`, writes the caller's owner token into it, and keeps retrying
//! until a wait budget runs out. Within one process the attempts for a given
//! path are additionally serialised through an in-memory mutex so that a
//! release can never interleave with another thread's token write.
//!
//! The lock is not crash safe: a file left behind by a killed process makes
//! every later acquisition time out until an operator removes it.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use once_cell::sync::Lazy;
use remotecmd_config::LockTimings;
use thiserror::Error;
use tracing::{debug, info, warn};

const LOCK_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lock");

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

static LOCAL_GATES: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Wait budget for [`FileLock::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Total time an acquisition may spend waiting.
    pub max_wait: Duration,
    /// Pause between attempts.
    pub poll_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(30),
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl From<LockTimings> for LockOptions {
    fn from(timings: LockTimings) -> Self {
        Self {
            max_wait: timings.max_wait,
            poll_interval: timings.poll_interval,
        }
    }
}

/// Errors raised while acquiring or releasing a lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock stayed held for the whole wait budget.
    #[error("timed out after {}ms waiting for lock '{}'", waited.as_millis(), path.display())]
    Timeout {
        /// Lock file that stayed present.
        path: PathBuf,
        /// Time spent waiting.
        waited: Duration,
    },
    /// The lock file could not be created, written, or removed.
    #[error("lock file '{}' could not be updated: {source}", path.display())]
    Io {
        /// Lock file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Entry point for acquiring file locks.
#[derive(Debug, Clone, Copy)]
pub struct FileLock;

impl FileLock {
    /// Acquires the lock at `path`, waiting up to `options.max_wait`.
    ///
    /// Attempts are spaced by `options.poll_interval`, shortened so the wait
    /// never overshoots the budget, and one last attempt is made when the
    /// budget is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] when the file stayed present for the
    /// whole budget and [`LockError::Io`] for any other filesystem failure,
    /// including a missing parent directory.
    pub fn acquire(
        path: &Path,
        owner_token: &str,
        options: &LockOptions,
    ) -> Result<LockHandle, LockError> {
        let resource_path = canonical_lock_path(path).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let gate = local_gate(&resource_path);
        let started = Instant::now();
        loop {
            if let Some(handle) = try_create(&gate, &resource_path, owner_token)? {
                info!(
                    target: LOCK_TARGET,
                    path = %resource_path.display(),
                    owner = owner_token,
                    waited_ms = started.elapsed().as_millis(),
                    "lock acquired"
                );
                return Ok(handle);
            }

            let waited = started.elapsed();
            let Some(remaining) = options.max_wait.checked_sub(waited).filter(|r| !r.is_zero())
            else {
                warn!(
                    target: LOCK_TARGET,
                    path = %resource_path.display(),
                    waited_ms = waited.as_millis(),
                    "lock wait budget exhausted"
                );
                return Err(LockError::Timeout {
                    path: resource_path,
                    waited,
                });
            };
            let pause = options.poll_interval.max(MIN_POLL_INTERVAL).min(remaining);
            debug!(
                target: LOCK_TARGET,
                path = %resource_path.display(),
                pause_ms = pause.as_millis(),
                "lock held elsewhere; waiting"
            );
            thread::sleep(pause);
        }
    }
}

/// Proof of lock ownership. Dropping the handle releases the lock.
#[derive(Debug)]
pub struct LockHandle {
    resource_path: PathBuf,
    owner_token: String,
    acquired_at: SystemTime,
    gate: Arc<Mutex<()>>,
    released: bool,
}

impl LockHandle {
    /// Canonical path of the lock file.
    #[must_use]
    pub fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    /// Token written into the lock file.
    #[must_use]
    pub fn owner_token(&self) -> &str {
        &self.owner_token
    }

    /// When the lock was taken.
    #[must_use]
    pub const fn acquired_at(&self) -> SystemTime {
        self.acquired_at
    }

    /// Releases the lock by removing its file.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Io`] if the file exists but cannot be removed.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.remove_file()
    }

    fn remove_file(&self) -> Result<(), LockError> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.resource_path) {
            Ok(()) => {
                debug!(
                    target: LOCK_TARGET,
                    path = %self.resource_path.display(),
                    "lock released"
                );
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Io {
                path: self.resource_path.clone(),
                source,
            }),
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = self.remove_file() {
            warn!(
                target: LOCK_TARGET,
                error = %error,
                "failed to release lock"
            );
        }
    }
}

/// Resolves `..` and symlinks in the parent directory so every spelling of
/// a lock path shares one in-process gate. The file itself may not exist.
fn canonical_lock_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(fs::canonicalize(parent)?.join(name)),
        _ => Ok(absolute),
    }
}

fn local_gate(path: &Path) -> Arc<Mutex<()>> {
    let mut gates = LOCAL_GATES.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(gates.entry(path.to_path_buf()).or_default())
}

fn try_create(
    gate: &Arc<Mutex<()>>,
    path: &Path,
    owner_token: &str,
) -> Result<Option<LockHandle>, LockError> {
    let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
        Err(source) => {
            return Err(LockError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if let Err(source) = file
        .write_all(owner_token.as_bytes())
        .and_then(|()| file.sync_all())
    {
        drop(file);
        if let Err(error) = fs::remove_file(path) {
            warn!(
                target: LOCK_TARGET,
                path = %path.display(),
                error = %error,
                "failed to remove partially written lock file"
            );
        }
        return Err(LockError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(Some(LockHandle {
        resource_path: path.to_path_buf(),
        owner_token: owner_token.to_owned(),
        acquired_at: SystemTime::now(),
        gate: Arc::clone(gate),
        released: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn short(max_wait_ms: u64, poll_ms: u64) -> LockOptions {
        LockOptions {
            max_wait: Duration::from_millis(max_wait_ms),
            poll_interval: Duration::from_millis(poll_ms),
        }
    }

    #[rstest]
    fn spellings_of_one_path_share_a_resource(scratch: TempDir) {
        fs::create_dir(scratch.path().join("nested")).expect("create nested dir");
        let direct = scratch.path().join("server.lock");
        let roundabout = scratch.path().join("nested").join("..").join("server.lock");
        let expected = fs::canonicalize(scratch.path())
            .expect("canonical dir")
            .join("server.lock");

        let handle = FileLock::acquire(&roundabout, "first", &short(100, 10)).expect("acquire");
        assert_eq!(handle.resource_path(), expected.as_path());
        assert!(Arc::ptr_eq(&handle.gate, &local_gate(&expected)));
        drop(handle);

        let again = FileLock::acquire(&direct, "second", &short(100, 10)).expect("reacquire");
        assert_eq!(again.resource_path(), expected.as_path());
    }

    #[rstest]
    fn acquire_writes_owner_token(scratch: TempDir) {
        let path = scratch.path().join("vhost.lock");
        let handle = FileLock::acquire(&path, "42", &short(100, 10)).expect("acquire");
        assert_eq!(fs::read_to_string(&path).expect("read lock"), "42");
        assert_eq!(handle.owner_token(), "42");
        assert!(handle.resource_path().is_absolute());
        handle.release().expect("release");
        assert!(!path.exists());
    }

    #[rstest]
    fn dropping_the_handle_releases(scratch: TempDir) {
        let path = scratch.path().join("server.lock");
        {
            let _handle = FileLock::acquire(&path, "owner", &short(100, 10)).expect("acquire");
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[rstest]
    fn held_lock_times_out(scratch: TempDir) {
        let path = scratch.path().join("held.lock");
        let _held = FileLock::acquire(&path, "first", &short(100, 10)).expect("acquire");

        let started = Instant::now();
        let error = FileLock::acquire(&path, "second", &short(80, 20)).expect_err("must time out");
        assert!(started.elapsed() >= Duration::from_millis(80));
        assert!(matches!(error, LockError::Timeout { .. }));
        assert_eq!(fs::read_to_string(&path).expect("read lock"), "first");
    }

    #[rstest]
    fn wait_never_overshoots_the_budget(scratch: TempDir) {
        let path = scratch.path().join("stale.lock");
        fs::write(&path, "stale").expect("seed stale lock");

        let started = Instant::now();
        let options = LockOptions {
            max_wait: Duration::from_millis(100),
            poll_interval: Duration::from_secs(10),
        };
        let error = FileLock::acquire(&path, "late", &options).expect_err("must time out");
        assert!(matches!(error, LockError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[rstest]
    fn waiter_acquires_after_release(scratch: TempDir) {
        let path = scratch.path().join("handoff.lock");
        let held = FileLock::acquire(&path, "first", &short(100, 10)).expect("acquire");

        let waiter_path = path.clone();
        let waiter = thread::spawn(move || {
            FileLock::acquire(&waiter_path, "second", &short(5_000, 20)).map(|handle| {
                let token = fs::read_to_string(handle.resource_path()).unwrap_or_default();
                drop(handle);
                token
            })
        });

        thread::sleep(Duration::from_millis(100));
        held.release().expect("release");
        let token = waiter.join().expect("join waiter").expect("waiter acquires");
        assert_eq!(token, "second");
    }

    #[rstest]
    fn only_one_holder_at_a_time(scratch: TempDir) {
        let path = scratch.path().join("shared.lock");
        let inside = Arc::new(AtomicBool::new(false));
        let entries = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..6)
            .map(|index| {
                let worker_path = path.clone();
                let worker_inside = Arc::clone(&inside);
                let worker_entries = Arc::clone(&entries);
                thread::spawn(move || {
                    let handle =
                        FileLock::acquire(&worker_path, &index.to_string(), &short(10_000, 5))
                            .expect("acquire");
                    assert!(
                        !worker_inside.swap(true, Ordering::SeqCst),
                        "two holders inside the protected section"
                    );
                    thread::sleep(Duration::from_millis(15));
                    worker_inside.store(false, Ordering::SeqCst);
                    worker_entries.fetch_add(1, Ordering::SeqCst);
                    drop(handle);
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("worker panicked");
        }
        assert_eq!(entries.load(Ordering::SeqCst), 6);
        assert!(!path.exists());
    }

    #[rstest]
    fn missing_directory_is_an_io_error(scratch: TempDir) {
        let path = scratch.path().join("absent").join("x.lock");
        let error = FileLock::acquire(&path, "t", &short(50, 10)).expect_err("must fail");
        assert!(matches!(error, LockError::Io { .. }));
    }
}
