//! koch-lib: an incremental build engine.
//!
//! This crate decides which targets are stale, rebuilds them in dependency
//! order and remembers what each successful build was made from:
//! - `Target`: a named build unit with prerequisites and a build action
//! - `Registry`: the table of targets and ad hoc commands
//! - `FingerprintStore`: persisted content checksums per target
//! - `Driver`: the recursive resolution and rebuild algorithm
//! - `Dispatcher`: maps command-line tokens to targets and commands

pub mod action;
pub mod buildfile;
pub mod consts;
pub mod dispatch;
pub mod driver;
pub mod fingerprint;
pub mod lock;
pub mod target;
