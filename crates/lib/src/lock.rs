//! Advisory locking of the fingerprint store.
//!
//! Two koch processes sharing one store would overwrite each other's
//! fingerprints. The driver therefore takes an exclusive, non-blocking lock
//! on a sibling file `<store>.lock` and keeps it until it is dropped. The
//! lock file records who holds it, so a second process can say who is in
//! the way.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Who holds a build lock, as written into the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
  pub pid: u32,
  /// Seconds since the Unix epoch at which the lock was taken.
  pub since: u64,
  /// Command line of the holding process, e.g. `koch -f all`.
  pub invocation: String,
}

impl LockHolder {
  fn current(invocation: &str) -> Self {
    Self {
      pid: std::process::id(),
      since: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default(),
      invocation: invocation.to_string(),
    }
  }
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error(
    "fingerprint store is in use by '{}' (pid {}, since {}); delete '{}' if that build is gone",
    .holder.invocation, .holder.pid, .holder.since, .path.display()
  )]
  Held { holder: LockHolder, path: PathBuf },

  #[error("fingerprint store is in use by another build; delete '{}' if no build is running", .path.display())]
  HeldByUnknown { path: PathBuf },

  #[error("cannot lock '{}': {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Exclusive lock on one fingerprint store, released on drop.
#[derive(Debug)]
pub struct BuildLock {
  file: File,
  path: PathBuf,
}

impl BuildLock {
  /// `<store>.lock`.
  pub fn path_for(store: &Path) -> PathBuf {
    let mut name = store.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
  }

  /// Lock the store at `store` on behalf of `invocation`.
  ///
  /// Fails immediately when another process holds the lock.
  pub fn acquire(store: &Path, invocation: &str) -> Result<Self, LockError> {
    let path = Self::path_for(store);
    let io_err = |source| LockError::Io {
      path: path.clone(),
      source,
    };

    if let Some(dir) = path.parent()
      && !dir.as_os_str().is_empty()
    {
      fs::create_dir_all(dir).map_err(io_err)?;
    }

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&path)
      .map_err(io_err)?;

    if !try_lock_exclusive(&file).map_err(io_err)? {
      return Err(match read_holder(&path) {
        Some(holder) => LockError::Held { holder, path },
        None => LockError::HeldByUnknown { path },
      });
    }

    let holder = LockHolder::current(invocation);
    write_holder(&file, &holder).map_err(io_err)?;
    debug!(path = %path.display(), pid = holder.pid, "locked fingerprint store");

    Ok(Self { file, path })
  }

  /// The holder record, read through the locked handle (Windows refuses a
  /// second handle on a locked file).
  pub fn holder(&self) -> io::Result<LockHolder> {
    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    serde_json::from_str(&content).map_err(io::Error::other)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

fn write_holder(mut file: &File, holder: &LockHolder) -> io::Result<()> {
  let content = serde_json::to_vec(holder).map_err(io::Error::other)?;
  file.set_len(0)?;
  file.seek(SeekFrom::Start(0))?;
  file.write_all(&content)?;
  file.flush()
}

fn read_holder(path: &Path) -> Option<LockHolder> {
  let content = fs::read_to_string(path).ok()?;
  serde_json::from_str(&content).ok()
}

/// `Ok(false)` when another handle holds the lock.
#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  match flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive) {
    Ok(()) => Ok(true),
    Err(errno) if errno == rustix::io::Errno::WOULDBLOCK => Ok(false),
    Err(errno) => Err(io::Error::from_raw_os_error(errno.raw_os_error())),
  }
}

/// `Ok(false)` when another handle holds the lock.
#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};
  use windows_sys::Win32::System::IO::OVERLAPPED;

  let handle = file.as_raw_handle() as HANDLE;
  // SAFETY: a zeroed OVERLAPPED locks from offset 0; `handle` is open for
  // the duration of the call.
  let locked = unsafe {
    let mut overlapped: OVERLAPPED = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if locked != 0 {
    return Ok(true);
  }
  let err = io::Error::last_os_error();
  if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
    Ok(false)
  } else {
    Err(err)
  }
}
