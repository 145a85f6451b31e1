//! The table of declared targets and commands.

use std::collections::HashMap;

use tracing::debug;

use super::graph::TargetGraph;
use super::types::{Command, RegistryError, Target};
use crate::consts::TARGET_SIGIL;

/// Lookup table from names to target and command definitions.
///
/// A registry is built once by the host program and then passed by
/// reference to the [`Driver`](crate::driver::Driver) and
/// [`Dispatcher`](crate::dispatch::Dispatcher).
#[derive(Debug, Default)]
pub struct Registry {
  targets: Vec<Target>,
  target_index: HashMap<String, usize>,
  commands: Vec<Command>,
  command_index: HashMap<String, usize>,
  default_target: Option<String>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a target and return its name.
  ///
  /// Anonymous targets are named `#<n>`, where `n` is the number of targets
  /// registered before them.
  pub fn register(&mut self, mut target: Target) -> Result<String, RegistryError> {
    if target.name.is_empty() {
      target.name = format!("{}{}", TARGET_SIGIL, self.targets.len());
    }

    if self.target_index.contains_key(&target.name) {
      return Err(RegistryError::DuplicateTarget(target.name));
    }
    if self.command_index.contains_key(&target.name) {
      return Err(RegistryError::DuplicateCommand(target.name));
    }

    debug!(
      name = %target.name,
      prerequisites = target.prerequisites.len(),
      "registered target"
    );

    let name = target.name.clone();
    self.target_index.insert(name.clone(), self.targets.len());
    self.targets.push(target);
    Ok(name)
  }

  /// Register an ad hoc command.
  pub fn register_command(&mut self, command: Command) -> Result<(), RegistryError> {
    if self.command_index.contains_key(&command.name) || self.target_index.contains_key(&command.name) {
      return Err(RegistryError::DuplicateCommand(command.name));
    }

    debug!(name = %command.name, arity = ?command.arity, "registered command");

    self.command_index.insert(command.name.clone(), self.commands.len());
    self.commands.push(command);
    Ok(())
  }

  /// Designate the target built when no target is requested.
  pub fn set_default(&mut self, name: impl Into<String>) {
    self.default_target = Some(name.into());
  }

  pub fn default_target(&self) -> Option<&str> {
    self.default_target.as_deref()
  }

  pub fn get(&self, name: &str) -> Option<&Target> {
    self.target_index.get(name).map(|&idx| &self.targets[idx])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.target_index.contains_key(name)
  }

  pub fn command(&self, name: &str) -> Option<&Command> {
    self.command_index.get(name).map(|&idx| &self.commands[idx])
  }

  pub fn has_command(&self, name: &str) -> bool {
    self.command_index.contains_key(name)
  }

  /// All targets in registration order.
  pub fn targets(&self) -> impl Iterator<Item = &Target> {
    self.targets.iter()
  }

  /// Targets carrying a description, in registration order.
  pub fn described_targets(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .targets
      .iter()
      .filter_map(|t| t.desc.as_deref().map(|desc| (t.name.as_str(), desc)))
  }

  /// All commands in registration order.
  pub fn commands(&self) -> impl Iterator<Item = &Command> {
    self.commands.iter()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  /// Check the static shape of the declared targets.
  ///
  /// Verifies that the default target exists, that every direct `#ref`
  /// names a registered target, and that direct references form no cycle.
  /// Lazy prerequisites are only known at build time and are not checked.
  pub fn validate(&self) -> Result<(), RegistryError> {
    if let Some(default) = &self.default_target
      && !self.contains(default)
    {
      return Err(RegistryError::UnknownDefault(default.clone()));
    }

    TargetGraph::from_registry(self)?.verify_acyclic()
  }
}
