//! Configuration, reports and errors of the build driver.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::outcome::Outcome;
use crate::action::ActionError;
use crate::consts::{FINGERPRINTS_ENV, FINGERPRINTS_FILENAME};
use crate::fingerprint::FingerprintError;
use crate::lock::LockError;

/// Configuration for one driver session.
#[derive(Debug, Clone)]
pub struct MakeConfig {
  /// Rebuild every resolved target even if nothing changed.
  pub force: bool,

  /// Record and log a justification for every staleness decision.
  pub explain: bool,

  /// Path of the fingerprint store.
  pub fingerprints: PathBuf,

  /// Shell override for shell actions.
  pub shell: Option<String>,

  /// Per-command time limit; `None` waits forever.
  pub timeout: Option<Duration>,

  /// Hold an exclusive lock on the fingerprint store while the driver lives.
  pub lock: bool,

  /// Recorded in the lock file so a blocked process can name the holder.
  pub invocation: String,
}

impl MakeConfig {
  /// Apply overrides from the environment (`KOCH_FINGERPRINTS`).
  pub fn with_env_overrides(mut self) -> Self {
    if let Ok(path) = std::env::var(FINGERPRINTS_ENV)
      && !path.is_empty()
    {
      self.fingerprints = PathBuf::from(path);
    }
    self
  }
}

impl Default for MakeConfig {
  fn default() -> Self {
    Self {
      force: false,
      explain: false,
      fingerprints: PathBuf::from(FINGERPRINTS_FILENAME),
      shell: None,
      timeout: None,
      lock: true,
      invocation: "koch".to_string(),
    }
  }
}

/// A target whose build action failed.
#[derive(Debug)]
pub struct FailedTarget {
  pub name: String,
  pub error: ActionError,
}

/// What happened during one `make` call.
#[derive(Debug)]
pub struct MakeReport {
  /// The requested target.
  pub target: String,

  /// Outcome of the requested target.
  pub outcome: Outcome,

  /// Targets rebuilt successfully, in completion order.
  pub built: Vec<String>,

  /// Targets whose own build action failed.
  pub failed: Vec<FailedTarget>,

  /// Targets found up to date.
  pub up_to_date: Vec<String>,

  /// Staleness justifications, only recorded in explain mode.
  pub explanations: Vec<String>,
}

impl MakeReport {
  pub(crate) fn new(target: &str) -> Self {
    Self {
      target: target.to_string(),
      outcome: Outcome::UpToDate,
      built: Vec::new(),
      failed: Vec::new(),
      up_to_date: Vec::new(),
      explanations: Vec::new(),
    }
  }

  pub fn is_success(&self) -> bool {
    !self.outcome.is_failure()
  }
}

/// Fatal errors of the driver.
///
/// Build action failures are not errors; they surface as [`Outcome::Failed`]
/// in the [`MakeReport`].
#[derive(Debug, Error)]
pub enum DriverError {
  #[error(transparent)]
  Fingerprint(#[from] FingerprintError),

  #[error(transparent)]
  Lock(#[from] LockError),

  #[error(transparent)]
  Runner(#[from] ActionError),

  #[error("unknown target '{0}'")]
  UnknownTarget(String),

  #[error("reference to unknown target '{reference}' in target '{target}'")]
  UnknownReference { target: String, reference: String },

  #[error("no target given and no default target configured")]
  NoDefaultTarget,

  #[error("cyclic dependency: {}", path.join(" -> "))]
  Cycle { path: Vec<String> },
}
