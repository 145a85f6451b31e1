use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::checksum::Checksum;
use crate::consts::FINGERPRINTS_VERSION;

/// Recorded checksums of one target, keyed by file path.
pub type FileChecksums = BTreeMap<String, Checksum>;

/// The persisted fingerprint record.
///
/// # Example File
///
/// ```json
/// {
///   "version": 1,
///   "targets": {
///     "compile": {
///       "src/main.c": 2415340125
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintTable {
  pub version: u32,
  pub targets: BTreeMap<String, FileChecksums>,
}

impl FingerprintTable {
  pub fn new() -> Self {
    Self {
      version: FINGERPRINTS_VERSION,
      targets: BTreeMap::new(),
    }
  }
}

impl Default for FingerprintTable {
  fn default() -> Self {
    Self::new()
  }
}

/// Errors that can occur when loading or saving the fingerprint store.
#[derive(Debug, Error)]
pub enum FingerprintError {
  /// The store file exists but could not be read.
  #[error("cannot read fingerprint store {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The store file exists but is not a valid fingerprint record.
  #[error("fingerprint store {path} is corrupt (delete it to start over): {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// The store was written by an incompatible version.
  #[error("fingerprint store {path} has unsupported version {version}")]
  UnsupportedVersion { path: PathBuf, version: u32 },

  /// Failed to serialize the record.
  #[error("failed to serialize fingerprints: {0}")]
  Serialize(#[source] serde_json::Error),

  /// Failed to write or replace the store file.
  #[error("cannot write fingerprint store {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to remove the store file.
  #[error("cannot remove fingerprint store {path}: {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}
