//! Target and command declarations.
//!
//! A [`Target`] is pure data plus opaque callables: its prerequisites, its
//! build action, an optional output file and the files to re-fingerprint
//! after a successful build. The [`Registry`] stores targets and ad hoc
//! [`Command`]s by name.

mod graph;
mod registry;
mod types;

pub use graph::TargetGraph;
pub use registry::Registry;
pub use types::*;
