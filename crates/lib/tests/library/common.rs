//! Shared helpers for library integration tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use koch_lib::action::ActionError;
use koch_lib::driver::MakeConfig;
use tempfile::TempDir;

/// A scratch project directory with its own fingerprint store.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// Path as the `&str` form accepted by `Target::prereq`.
  pub fn spec(&self, relative: &str) -> String {
    self.path(relative).to_string_lossy().into_owned()
  }

  pub fn write(&self, relative: &str, content: &str) {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }

  pub fn remove(&self, relative: &str) {
    std::fs::remove_file(self.path(relative)).unwrap();
  }

  pub fn store_path(&self) -> PathBuf {
    self.path("koch.dat")
  }

  pub fn config(&self) -> MakeConfig {
    MakeConfig {
      fingerprints: self.store_path(),
      ..MakeConfig::default()
    }
  }
}

/// Counts how often a build callback ran.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
  pub fn get(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }

  /// A callback that counts its invocations and succeeds.
  pub fn succeed(&self) -> impl Fn() -> Result<i32, ActionError> + Send + Sync + 'static {
    let count = self.0.clone();
    move || {
      count.fetch_add(1, Ordering::SeqCst);
      Ok(0)
    }
  }

  /// A callback that counts its invocations and returns `status`.
  pub fn exit_with(&self, status: i32) -> impl Fn() -> Result<i32, ActionError> + Send + Sync + 'static {
    let count = self.0.clone();
    move || {
      count.fetch_add(1, Ordering::SeqCst);
      Ok(status)
    }
  }
}
