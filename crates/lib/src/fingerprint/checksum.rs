//! Content checksums used for change detection.
//!
//! This module provides:
//! - `Checksum`: a 32-bit content fingerprint
//! - `checksum_file()`: streaming checksum of a file's full content
//! - `checksum_bytes()`: checksum of arbitrary bytes
//!
//! The checksum is xxHash32 with a zero seed. It is fast and stable across
//! runs and platforms, but it is not collision resistant: two different
//! contents may map to the same value, in which case the change goes unnoticed.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::{Xxh32, xxh32};

const SEED: u32 = 0;

/// A 32-bit fingerprint of a file's content.
///
/// Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(pub u32);

impl std::fmt::Display for Checksum {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:08x}", self.0)
  }
}

/// Checksum a file's contents.
pub fn checksum_file(path: &Path) -> io::Result<Checksum> {
  let mut file = fs::File::open(path)?;
  let mut hasher = Xxh32::new(SEED);
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(Checksum(hasher.digest()))
}

/// Checksum arbitrary bytes.
pub fn checksum_bytes(data: &[u8]) -> Checksum {
  Checksum(xxh32(data, SEED))
}
