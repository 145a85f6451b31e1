//! Fingerprint persistence and staleness decisions.
//!
//! The store keeps two tables:
//! - the durable table, loaded from disk and written back by [`FingerprintStore::save`]
//! - a shadow table, where every checksum computed during a build is staged
//!
//! Shadow entries only reach the durable table through [`FingerprintStore::commit`],
//! which the driver calls after a target was rebuilt successfully. A failed build
//! therefore never alters what was recorded for its target.
//!
//! The whole file is rewritten once per `make`. A crash between a successful
//! build and the final save loses that build's fingerprints, which costs one
//! extra rebuild on the next run.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::checksum::{Checksum, checksum_file};
use super::types::{FileChecksums, FingerprintError, FingerprintTable};
use crate::consts::FINGERPRINTS_VERSION;

#[derive(Debug)]
pub struct FingerprintStore {
  path: PathBuf,
  durable: FingerprintTable,
  shadow: HashMap<String, FileChecksums>,
}

impl FingerprintStore {
  /// Load the store from `path`.
  ///
  /// A missing file yields an empty store. A file that exists but cannot be
  /// read or parsed is an error; there is no recovery short of deleting it.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self, FingerprintError> {
    let path = path.into();

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no fingerprint store yet");
        return Ok(Self::empty(path));
      }
      Err(source) => return Err(FingerprintError::Read { path, source }),
    };

    let durable: FingerprintTable = match serde_json::from_str(&content) {
      Ok(table) => table,
      Err(source) => return Err(FingerprintError::Parse { path, source }),
    };

    if durable.version != FINGERPRINTS_VERSION {
      return Err(FingerprintError::UnsupportedVersion {
        version: durable.version,
        path,
      });
    }

    debug!(
      path = %path.display(),
      targets = durable.targets.len(),
      "loaded fingerprint store"
    );

    Ok(Self {
      path,
      durable,
      shadow: HashMap::new(),
    })
  }

  /// An empty store that will be written to `path`.
  pub fn empty(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      durable: FingerprintTable::new(),
      shadow: HashMap::new(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Decide whether `file` changed since `target` was last built.
  ///
  /// A file that does not exist counts as changed, so the target is attempted
  /// and fails loudly if the file was truly required. Whenever the file can be
  /// read, its checksum is staged in the shadow table for `target`, whatever
  /// the outcome of the comparison.
  pub fn has_changed(&mut self, target: &str, file: &Path) -> bool {
    let shadow = self.shadow.entry(target.to_string()).or_default();

    let current = match checksum_file(file) {
      Ok(checksum) => checksum,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        warn!(name = %target, file = %file.display(), "'{}' does not exist!", file.display());
        return true;
      }
      Err(e) => {
        warn!(name = %target, file = %file.display(), error = %e, "cannot read prerequisite");
        return true;
      }
    };

    let key = file_key(file);
    shadow.insert(key.clone(), current);

    match self.durable.targets.get(target).and_then(|files| files.get(&key)) {
      Some(recorded) => *recorded != current,
      None => true,
    }
  }

  /// Promote the staged checksums of `target` into the durable table.
  ///
  /// The durable entry is replaced as a whole, so files that were not staged
  /// during this build drop out of the record.
  pub fn commit(&mut self, target: &str) {
    let staged = self.shadow.remove(target).unwrap_or_default();
    debug!(name = %target, files = staged.len(), "committing fingerprints");
    self.durable.targets.insert(target.to_string(), staged);
  }

  /// Forget the staged checksums of `target`.
  pub fn discard(&mut self, target: &str) {
    self.shadow.remove(target);
  }

  /// Forget the staged checksums of every target.
  pub fn discard_all(&mut self) {
    self.shadow.clear();
  }

  /// Forget everything: both tables and the persisted file.
  ///
  /// Returns whether a file was removed. A later [`FingerprintStore::save`]
  /// writes an empty record again.
  pub fn clear(&mut self) -> Result<bool, FingerprintError> {
    self.durable.targets.clear();
    self.shadow.clear();
    Self::remove(&self.path)
  }

  /// The durable checksum recorded for `(target, file)`.
  pub fn recorded(&self, target: &str, file: &Path) -> Option<Checksum> {
    self
      .durable
      .targets
      .get(target)
      .and_then(|files| files.get(&file_key(file)))
      .copied()
  }

  /// Whether anything was ever committed for `target`.
  pub fn has_target(&self, target: &str) -> bool {
    self.durable.targets.contains_key(target)
  }

  pub fn table(&self) -> &FingerprintTable {
    &self.durable
  }

  /// Write the durable table to disk.
  ///
  /// Uses atomic write (write to temp, then rename) to prevent corruption.
  pub fn save(&self) -> Result<(), FingerprintError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(|source| FingerprintError::Write {
        path: self.path.clone(),
        source,
      })?;
    }

    let content = serde_json::to_string_pretty(&self.durable).map_err(FingerprintError::Serialize)?;
    let temp_path = temp_path(&self.path);

    fs::write(&temp_path, &content).map_err(|source| FingerprintError::Write {
      path: temp_path.clone(),
      source,
    })?;
    fs::rename(&temp_path, &self.path).map_err(|source| FingerprintError::Write {
      path: self.path.clone(),
      source,
    })?;

    debug!(
      path = %self.path.display(),
      targets = self.durable.targets.len(),
      "saved fingerprint store"
    );

    Ok(())
  }

  /// Delete the persisted store at `path`.
  ///
  /// Returns whether a file was removed.
  pub fn remove(path: &Path) -> Result<bool, FingerprintError> {
    match fs::remove_file(path) {
      Ok(()) => {
        info!(path = %path.display(), "removed fingerprint store");
        Ok(true)
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(source) => Err(FingerprintError::Remove {
        path: path.to_path_buf(),
        source,
      }),
    }
  }
}

fn file_key(file: &Path) -> String {
  file.to_string_lossy().into_owned()
}

fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_os_string();
  name.push(".tmp");
  PathBuf::from(name)
}
