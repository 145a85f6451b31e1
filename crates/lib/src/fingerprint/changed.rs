//! Change checks outside the target graph.
//!
//! Host code that drives its own build steps can ask whether a set of files
//! changed under an id of its choosing, run the step, and record the new
//! fingerprints only once the step succeeded:
//!
//! ```no_run
//! use koch_lib::fingerprint::ChangeCheck;
//!
//! # fn compile() -> bool { true }
//! let mut check = ChangeCheck::open("koch.dat", "pascal", ["a.pas", "b.pas"])?;
//! if check.has_changed() && compile() {
//!   check.success()?;
//! }
//! # Ok::<(), koch_lib::fingerprint::FingerprintError>(())
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use super::store::FingerprintStore;
use super::types::FingerprintError;

/// A pending change check on `files` under `id`.
#[derive(Debug)]
pub struct ChangeCheck {
  store: FingerprintStore,
  id: String,
  files: Vec<PathBuf>,
  explain: bool,
}

impl ChangeCheck {
  /// Load the store at `store` and prepare a check of `files`.
  pub fn open(
    store: impl Into<PathBuf>,
    id: impl Into<String>,
    files: impl IntoIterator<Item = impl Into<PathBuf>>,
  ) -> Result<Self, FingerprintError> {
    Ok(Self {
      store: FingerprintStore::load(store)?,
      id: id.into(),
      files: files.into_iter().map(Into::into).collect(),
      explain: false,
    })
  }

  /// Log why the check reports a change.
  pub fn explain(mut self, explain: bool) -> Self {
    self.explain = explain;
    self
  }

  /// Whether any file changed since the last [`ChangeCheck::success`] under
  /// this id. An id never recorded counts as changed, as does a missing file.
  pub fn has_changed(&mut self) -> bool {
    let mut changed = false;
    if !self.store.has_target(&self.id) {
      if self.explain {
        info!("no entries for target '{}'", self.id);
      }
      changed = true;
    }

    for file in &self.files {
      if self.store.has_changed(&self.id, file) {
        if self.explain {
          info!("'{}' modified since last build", file.display());
        }
        changed = true;
      }
    }
    changed
  }

  /// Also record `file`, typically an output of the step.
  pub fn update(&mut self, file: &Path) {
    self.store.has_changed(&self.id, file);
  }

  /// Record the checked files and persist the store.
  pub fn success(mut self) -> Result<(), FingerprintError> {
    self.store.commit(&self.id);
    self.store.save()
  }
}
