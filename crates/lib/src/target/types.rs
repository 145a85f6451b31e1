use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::action::{Action, ActionError};
use crate::consts::TARGET_SIGIL;

/// Signature of a prerequisite list computed at build time.
pub type LazyFn = dyn Fn() -> Vec<Prerequisite> + Send + Sync;

/// A prerequisite list that is only known when the target is resolved,
/// e.g. the expansion of a glob pattern.
#[derive(Clone)]
pub struct LazyPrerequisites(Arc<LazyFn>);

impl LazyPrerequisites {
  pub fn new(f: impl Fn() -> Vec<Prerequisite> + Send + Sync + 'static) -> Self {
    Self(Arc::new(f))
  }

  pub fn expand(&self) -> Vec<Prerequisite> {
    (self.0)()
  }
}

impl fmt::Debug for LazyPrerequisites {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Lazy(..)")
  }
}

/// One entry of a target's prerequisite list.
#[derive(Debug, Clone)]
pub enum Prerequisite {
  /// A file whose content is fingerprinted.
  File(PathBuf),
  /// Another registered target.
  Target(String),
  /// Prerequisites computed when the target is resolved.
  Lazy(LazyPrerequisites),
}

impl Prerequisite {
  /// Parse the textual form: a leading `#` names a target, anything else is a file path.
  ///
  /// ```
  /// use koch_lib::target::Prerequisite;
  ///
  /// assert!(matches!(Prerequisite::parse("#gen"), Prerequisite::Target(name) if name == "gen"));
  /// assert!(matches!(Prerequisite::parse("src/main.c"), Prerequisite::File(_)));
  /// ```
  pub fn parse(spec: &str) -> Self {
    match spec.strip_prefix(TARGET_SIGIL) {
      Some(name) => Prerequisite::Target(name.to_string()),
      None => Prerequisite::File(PathBuf::from(spec)),
    }
  }

  pub fn file(path: impl Into<PathBuf>) -> Self {
    Prerequisite::File(path.into())
  }

  pub fn target(name: impl Into<String>) -> Self {
    Prerequisite::Target(name.into())
  }

  pub fn lazy(f: impl Fn() -> Vec<Prerequisite> + Send + Sync + 'static) -> Self {
    Prerequisite::Lazy(LazyPrerequisites::new(f))
  }
}

impl fmt::Display for Prerequisite {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Prerequisite::File(path) => write!(f, "{}", path.display()),
      Prerequisite::Target(name) => write!(f, "{}{}", TARGET_SIGIL, name),
      Prerequisite::Lazy(_) => f.write_str("<lazy>"),
    }
  }
}

/// A named build unit.
///
/// Targets are declared once, registered in a [`Registry`](super::Registry)
/// and never mutated afterwards.
///
/// # Example
///
/// ```
/// use koch_lib::target::{Prerequisite, Target};
///
/// let target = Target::new("nimrod")
///   .desc("builds the compiler")
///   .prereq("#gen")
///   .prereq("rod/nimrod.nim")
///   .action("nim compile rod/nimrod")
///   .output("bin/nimrod");
///
/// assert_eq!(target.prerequisites.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Target {
  /// Unique name. Empty for anonymous targets until registered.
  pub name: String,
  /// One-line description; described targets are listed in help output.
  pub desc: Option<String>,
  pub prerequisites: Vec<Prerequisite>,
  pub action: Action,
  /// A file whose absence forces a rebuild.
  pub output: Option<PathBuf>,
  /// Files re-fingerprinted after a successful build.
  pub modifies: Vec<PathBuf>,
}

impl Target {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// A target whose name is assigned at registration (`#<n>`).
  pub fn anonymous() -> Self {
    Self::default()
  }

  pub fn desc(mut self, desc: impl Into<String>) -> Self {
    self.desc = Some(desc.into());
    self
  }

  /// Append a prerequisite in its textual form (see [`Prerequisite::parse`]).
  pub fn prereq(mut self, spec: &str) -> Self {
    self.prerequisites.push(Prerequisite::parse(spec));
    self
  }

  pub fn prereqs<'a>(mut self, specs: impl IntoIterator<Item = &'a str>) -> Self {
    self.prerequisites.extend(specs.into_iter().map(Prerequisite::parse));
    self
  }

  pub fn depends_on(mut self, prerequisite: Prerequisite) -> Self {
    self.prerequisites.push(prerequisite);
    self
  }

  pub fn lazy(mut self, f: impl Fn() -> Vec<Prerequisite> + Send + Sync + 'static) -> Self {
    self.prerequisites.push(Prerequisite::lazy(f));
    self
  }

  /// Set the build action. Calling it again replaces the previous action.
  pub fn action(mut self, action: impl Into<Action>) -> Self {
    self.action = action.into();
    self
  }

  pub fn callback(self, f: impl Fn() -> Result<i32, ActionError> + Send + Sync + 'static) -> Self {
    self.action(Action::callback(f))
  }

  pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
    self.output = Some(path.into());
    self
  }

  pub fn modifies(mut self, path: impl Into<PathBuf>) -> Self {
    self.modifies.push(path.into());
    self
  }

  /// Names of targets referenced directly, excluding lazy prerequisites.
  pub fn target_refs(&self) -> impl Iterator<Item = &str> {
    self.prerequisites.iter().filter_map(|p| match p {
      Prerequisite::Target(name) => Some(name.as_str()),
      _ => None,
    })
  }
}

/// How many arguments an ad hoc command consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
  /// Exactly this many of the following tokens.
  Fixed(usize),
  /// Every remaining token.
  Variadic,
}

/// Signature of an ad hoc command.
pub type CommandFn = dyn Fn(&[String]) -> Result<i32, ActionError> + Send + Sync;

/// What an ad hoc command does when invoked.
#[derive(Clone)]
pub enum CommandAction {
  /// Host code called with the command's arguments.
  Callback(Arc<CommandFn>),
  /// Forget every recorded fingerprint of the running build session.
  ResetFingerprints,
}

/// A named operation invoked from the command line instead of a target.
#[derive(Clone)]
pub struct Command {
  pub name: String,
  pub desc: String,
  pub arity: Arity,
  pub action: CommandAction,
}

impl Command {
  pub fn new(
    name: impl Into<String>,
    desc: impl Into<String>,
    arity: Arity,
    run: impl Fn(&[String]) -> Result<i32, ActionError> + Send + Sync + 'static,
  ) -> Self {
    Self {
      name: name.into(),
      desc: desc.into(),
      arity,
      action: CommandAction::Callback(Arc::new(run)),
    }
  }

  /// A command taking no arguments that resets the session's fingerprint
  /// store. The dispatcher runs it against its driver.
  pub fn reset_fingerprints(name: impl Into<String>, desc: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      desc: desc.into(),
      arity: Arity::Fixed(0),
      action: CommandAction::ResetFingerprints,
    }
  }

  /// Invoke a callback command. `Ok(0)` is success.
  ///
  /// Commands acting on a build session need one and fail here.
  pub fn call(&self, args: &[String]) -> Result<i32, ActionError> {
    match &self.action {
      CommandAction::Callback(run) => run(args),
      CommandAction::ResetFingerprints => Err(ActionError::callback(format!(
        "command '{}' needs a build session",
        self.name
      ))),
    }
  }
}

impl fmt::Debug for Command {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Command")
      .field("name", &self.name)
      .field("desc", &self.desc)
      .field("arity", &self.arity)
      .finish_non_exhaustive()
  }
}

/// Errors raised while declaring or validating targets and commands.
///
/// These are programming errors in the build description, not runtime
/// conditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  #[error("target '{0}' already exists!")]
  DuplicateTarget(String),

  #[error("command '{0}' already exists!")]
  DuplicateCommand(String),

  #[error("target '{target}' references unknown target '{reference}'")]
  UnknownReference { target: String, reference: String },

  #[error("default target '{0}' is not registered")]
  UnknownDefault(String),

  #[error("cyclic dependency involving target '{0}'")]
  Cycle(String),
}
