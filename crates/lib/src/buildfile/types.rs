use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::target::RegistryError;

/// A parsed `koch.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
  #[serde(default)]
  pub options: Options,

  #[serde(default, rename = "target")]
  pub targets: Vec<TargetDecl>,

  #[serde(default, rename = "command")]
  pub commands: Vec<CommandDecl>,
}

/// The `[options]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
  /// Target built when none is requested.
  pub default: Option<String>,
  /// Fingerprint store path, relative to the build file.
  pub fingerprints: Option<PathBuf>,
  /// Per-command timeout in seconds.
  pub timeout: Option<u64>,
  pub shell: Option<String>,
}

/// One `[[target]]` entry.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
  pub name: Option<String>,
  pub desc: Option<String>,
  #[serde(default)]
  pub prereqs: Vec<String>,
  /// Glob patterns expanded to file prerequisites at build time.
  #[serde(default)]
  pub globs: Vec<String>,
  pub cmd: Option<Script>,
  pub output: Option<PathBuf>,
  #[serde(default)]
  pub modifies: Vec<PathBuf>,
}

/// One `[[command]]` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandDecl {
  pub name: String,
  #[serde(default)]
  pub desc: String,
  pub run: Script,
  #[serde(default)]
  pub args: ArgsDecl,
}

/// A single command line or a list run in order.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Script {
  One(String),
  Many(Vec<String>),
}

impl Script {
  pub fn lines(&self) -> &[String] {
    match self {
      Script::One(line) => std::slice::from_ref(line),
      Script::Many(lines) => lines,
    }
  }
}

/// `args = <n>` or `args = "*"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgsDecl {
  Count(usize),
  Pattern(String),
}

impl Default for ArgsDecl {
  fn default() -> Self {
    ArgsDecl::Count(0)
  }
}

#[derive(Debug, Error)]
pub enum BuildFileError {
  #[error("Failed to read build file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse build file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid glob pattern '{pattern}' in target '{target}': {source}")]
  Pattern {
    target: String,
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("command '{command}': args must be a number or \"*\", got \"{value}\"")]
  InvalidArity { command: String, value: String },

  #[error(transparent)]
  Registry(#[from] RegistryError),
}
