use thiserror::Error;

use crate::action::ActionError;
use crate::driver::{DriverError, MakeReport, Outcome};

/// The result of running one ad hoc command.
#[derive(Debug)]
pub struct CommandRun {
  pub name: String,
  pub args: Vec<String>,
  pub result: Result<(), ActionError>,
}

/// One dispatched token and what came of it.
#[derive(Debug)]
pub enum Dispatched {
  Target(MakeReport),
  Command(CommandRun),
}

impl Dispatched {
  pub fn name(&self) -> &str {
    match self {
      Dispatched::Target(report) => &report.target,
      Dispatched::Command(run) => &run.name,
    }
  }

  pub fn is_success(&self) -> bool {
    match self {
      Dispatched::Target(report) => report.is_success(),
      Dispatched::Command(run) => run.result.is_ok(),
    }
  }
}

/// Everything run by one [`Dispatcher::run`](super::Dispatcher::run), in
/// invocation order.
#[derive(Debug, Default)]
pub struct DispatchReport {
  pub dispatched: Vec<Dispatched>,
  /// Tokens ignored because they looked like flags.
  pub skipped: Vec<String>,
}

impl DispatchReport {
  pub fn is_success(&self) -> bool {
    self.dispatched.iter().all(Dispatched::is_success)
  }

  /// Names of the targets and commands that failed.
  pub fn failures(&self) -> impl Iterator<Item = &str> {
    self.dispatched.iter().filter(|d| !d.is_success()).map(Dispatched::name)
  }

  /// Outcomes of the dispatched targets, in order.
  pub fn target_outcomes(&self) -> impl Iterator<Item = (&str, Outcome)> {
    self.dispatched.iter().filter_map(|d| match d {
      Dispatched::Target(report) => Some((report.target.as_str(), report.outcome)),
      Dispatched::Command(_) => None,
    })
  }
}

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("Invalid target/command: {0}")]
  UnknownTarget(String),

  #[error("command '{command}' expects {expected} arguments")]
  MissingArguments { command: String, expected: usize },

  #[error(transparent)]
  Driver(#[from] DriverError),
}
