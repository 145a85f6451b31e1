//! Maps command-line tokens to target builds and ad hoc commands.
//!
//! Flags are parsed by the host before the first positional token; the
//! dispatcher only sees what follows. Each token is resolved independently,
//! left to right:
//! - a registered target is brought up to date with [`Driver::make`]
//! - a registered command consumes its arguments from the following tokens;
//!   `clean` resets the driver's fingerprint store
//! - anything else is fatal
//!
//! An empty token list builds the default target.

mod types;

use tracing::{debug, error, warn};

use crate::action::ActionError;
use crate::driver::Driver;
use crate::target::{Arity, CommandAction};

pub use types::{CommandRun, DispatchError, DispatchReport, Dispatched};

pub struct Dispatcher<'r> {
  driver: Driver<'r>,
}

impl<'r> Dispatcher<'r> {
  pub fn new(driver: Driver<'r>) -> Self {
    Self { driver }
  }

  pub fn driver(&self) -> &Driver<'r> {
    &self.driver
  }

  pub fn into_driver(self) -> Driver<'r> {
    self.driver
  }

  /// Dispatch `tokens` in order.
  ///
  /// Every token is attempted even when an earlier target or command
  /// failed; the report says which failed. Unknown tokens, missing command
  /// arguments and driver errors stop dispatching immediately.
  pub fn run(&mut self, tokens: &[String]) -> Result<DispatchReport, DispatchError> {
    let mut report = DispatchReport::default();

    if tokens.is_empty() {
      debug!("no targets given, building default target");
      let made = self.driver.make(None)?;
      report.dispatched.push(Dispatched::Target(made));
      return Ok(report);
    }

    let registry = self.driver.registry();
    let mut i = 0;
    while i < tokens.len() {
      let token = &tokens[i];
      i += 1;

      if token.starts_with('-') {
        warn!(token = %token, "ignoring option after first target");
        report.skipped.push(token.clone());
        continue;
      }

      if registry.contains(token) {
        let made = self.driver.make(Some(token))?;
        report.dispatched.push(Dispatched::Target(made));
        continue;
      }

      let Some(command) = registry.command(token) else {
        return Err(DispatchError::UnknownTarget(token.clone()));
      };

      let args = match command.arity {
        Arity::Variadic => {
          let args = tokens[i..].to_vec();
          i = tokens.len();
          args
        }
        Arity::Fixed(n) => {
          if tokens.len() - i < n {
            return Err(DispatchError::MissingArguments {
              command: command.name.clone(),
              expected: n,
            });
          }
          let args = tokens[i..i + n].to_vec();
          i += n;
          args
        }
      };

      debug!(command = %command.name, args = ?args, "running command");
      let result = match &command.action {
        CommandAction::Callback(run) => match run(&args) {
          Ok(0) => Ok(()),
          Ok(status) => Err(ActionError::CallbackStatus(status)),
          Err(err) => Err(err),
        },
        CommandAction::ResetFingerprints => self.driver.clean().map(|_| ()).map_err(ActionError::callback),
      };
      if let Err(err) = &result {
        error!(command = %command.name, error = %err, "command '{}' failed", command.name);
      }

      report.dispatched.push(Dispatched::Command(CommandRun {
        name: command.name.clone(),
        args,
        result,
      }));
    }

    Ok(report)
  }
}
