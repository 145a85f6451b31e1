//! Build action execution.
//!
//! Actions are what a target does when it is rebuilt:
//!
//! - [`Action::Shell`] - run a command line through the platform shell
//! - [`Action::Callback`] - call a Rust closure returning an exit status
//! - [`Action::Sequence`] - run actions in order, stopping at the first failure
//!
//! Execution is synchronous from the caller's point of view. Shell commands
//! are driven by a single-threaded runtime owned by the [`ActionRunner`], which
//! is what makes per-command timeouts possible.

pub mod shell;
mod types;

pub use types::*;

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use shell::execute_shell;

/// Runs actions one at a time, blocking until each completes.
pub struct ActionRunner {
  runtime: Runtime,
  shell: Option<String>,
  timeout: Option<Duration>,
}

impl ActionRunner {
  /// Create a runner.
  ///
  /// # Arguments
  ///
  /// * `shell` - Shell override (defaults to `/bin/sh` on Unix, `cmd.exe` on Windows)
  /// * `timeout` - Per-command limit; `None` waits forever
  pub fn new(shell: Option<String>, timeout: Option<Duration>) -> Result<Self, ActionError> {
    let runtime = Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(ActionError::Runtime)?;

    Ok(Self {
      runtime,
      shell,
      timeout,
    })
  }

  /// Execute an action.
  ///
  /// Sequences stop at the first failing step; the remaining steps never run.
  pub fn run(&self, action: &Action) -> Result<(), ActionError> {
    match action {
      Action::Shell(cmd) => {
        if cmd.trim().is_empty() {
          return Ok(());
        }
        self.run_shell(cmd, &[])
      }
      Action::Callback(callback) => match callback.call()? {
        0 => Ok(()),
        status => Err(ActionError::CallbackStatus(status)),
      },
      Action::Sequence(actions) => {
        for (index, step) in actions.iter().enumerate() {
          debug!(step = index, total = actions.len(), "running action step");
          self.run(step)?;
        }
        Ok(())
      }
    }
  }

  /// Run a single shell command with positional arguments.
  pub fn run_shell(&self, cmd: &str, args: &[String]) -> Result<(), ActionError> {
    self
      .runtime
      .block_on(execute_shell(cmd, args, self.shell.as_deref(), self.timeout))
  }
}
