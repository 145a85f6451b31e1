//! Content fingerprints.
//!
//! Decides per-file staleness by comparing content checksums against the
//! values recorded at the end of each target's last successful build, and
//! persists those records across runs.

mod changed;
mod checksum;
mod store;
mod types;

pub use changed::ChangeCheck;
pub use checksum::{Checksum, checksum_bytes, checksum_file};
pub use store::FingerprintStore;
pub use types::{FileChecksums, FingerprintError, FingerprintTable};
