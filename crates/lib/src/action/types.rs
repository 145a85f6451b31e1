use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Signature of an in-process build step.
///
/// Returns an exit status: `Ok(0)` is success, any other status or an error
/// is a failure.
pub type CallbackFn = dyn Fn() -> Result<i32, ActionError> + Send + Sync;

/// A shareable in-process build step.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
  pub fn new(f: impl Fn() -> Result<i32, ActionError> + Send + Sync + 'static) -> Self {
    Self(Arc::new(f))
  }

  pub fn call(&self) -> Result<i32, ActionError> {
    (self.0)()
  }
}

impl fmt::Debug for Callback {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Callback(..)")
  }
}

/// The build action of a target.
///
/// # Variants
///
/// - [`Shell`](Action::Shell): a command line run through the platform shell
/// - [`Callback`](Action::Callback): a Rust closure returning an exit status
/// - [`Sequence`](Action::Sequence): actions run in order until one fails
///
/// An empty sequence does nothing and always succeeds.
#[derive(Debug, Clone)]
pub enum Action {
  Shell(String),
  Callback(Callback),
  Sequence(Vec<Action>),
}

impl Action {
  pub fn shell(cmd: impl Into<String>) -> Self {
    Action::Shell(cmd.into())
  }

  pub fn callback(f: impl Fn() -> Result<i32, ActionError> + Send + Sync + 'static) -> Self {
    Action::Callback(Callback::new(f))
  }

  pub fn sequence(actions: impl IntoIterator<Item = Action>) -> Self {
    Action::Sequence(actions.into_iter().collect())
  }

  /// Whether running this action does nothing at all.
  pub fn is_empty(&self) -> bool {
    match self {
      Action::Shell(cmd) => cmd.trim().is_empty(),
      Action::Callback(_) => false,
      Action::Sequence(actions) => actions.iter().all(Action::is_empty),
    }
  }
}

impl Default for Action {
  fn default() -> Self {
    Action::Sequence(Vec::new())
  }
}

impl From<&str> for Action {
  fn from(cmd: &str) -> Self {
    Action::Shell(cmd.to_string())
  }
}

impl From<String> for Action {
  fn from(cmd: String) -> Self {
    Action::Shell(cmd)
  }
}

/// Errors produced while running an action.
#[derive(Debug, Error)]
pub enum ActionError {
  /// A shell command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  ShellFailed { cmd: String, code: Option<i32> },

  /// A shell command could not be started.
  #[error("failed to spawn '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// A shell command ran longer than the configured timeout and was killed.
  #[error("command timed out after {}s: {cmd}", timeout.as_secs())]
  TimedOut { cmd: String, timeout: Duration },

  /// A callback returned a nonzero status.
  #[error("callback returned status {0}")]
  CallbackStatus(i32),

  /// A callback reported an error.
  #[error("callback failed: {0}")]
  Callback(String),

  /// The process runtime could not be created.
  #[error("failed to create process runtime: {0}")]
  Runtime(#[source] io::Error),
}

impl ActionError {
  /// Build a callback failure from any message.
  pub fn callback(message: impl fmt::Display) -> Self {
    ActionError::Callback(message.to_string())
  }
}
