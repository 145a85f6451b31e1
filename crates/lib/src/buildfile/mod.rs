//! Declarative build descriptions (`koch.toml`).
//!
//! A build file is one way of populating a [`Registry`]: every `[[target]]`
//! becomes a [`Target`] with shell actions, every `[[command]]` an ad hoc
//! [`Command`] running a shell script with its arguments as positional
//! parameters. Paths are interpreted relative to the current directory, so
//! hosts change into the build file's directory first.

mod types;

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::action::{Action, ActionRunner};
use crate::driver::MakeConfig;
use crate::target::{Arity, Command, Prerequisite, Registry, Target};

pub use types::{ArgsDecl, BuildFile, BuildFileError, CommandDecl, Options, Script, TargetDecl};

/// Name of the command registered when the build file does not define one.
pub const CLEAN_COMMAND: &str = "clean";

impl BuildFile {
  /// Read and parse the build file at `path`.
  pub fn load(path: &Path) -> Result<Self, BuildFileError> {
    let content = fs::read_to_string(path).map_err(|source| BuildFileError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  /// Parse build file text; `path` only appears in error messages.
  pub fn parse(content: &str, path: &Path) -> Result<Self, BuildFileError> {
    let file: BuildFile = toml::from_str(content).map_err(|source| BuildFileError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    debug!(
      path = %path.display(),
      targets = file.targets.len(),
      commands = file.commands.len(),
      "parsed build file"
    );
    Ok(file)
  }

  /// Copy `[options]` into `config`. Unset options leave `config` untouched.
  pub fn apply_options(&self, config: &mut MakeConfig) {
    if let Some(fingerprints) = &self.options.fingerprints {
      config.fingerprints = fingerprints.clone();
    }
    if let Some(secs) = self.options.timeout {
      config.timeout = Some(Duration::from_secs(secs));
    }
    if let Some(shell) = &self.options.shell {
      config.shell = Some(shell.clone());
    }
  }

  /// Register every declared target and command.
  ///
  /// Without `options.default` the first declared target is the default.
  /// A `clean` command resetting the fingerprint store is added unless the
  /// file declares a target or command with that name. The result is
  /// validated before it is returned.
  pub fn into_registry(self, config: &MakeConfig) -> Result<Registry, BuildFileError> {
    let mut registry = Registry::new();
    let mut first = None;

    for decl in self.targets {
      let target = target_from_decl(decl)?;
      let name = registry.register(target)?;
      if first.is_none() {
        first = Some(name);
      }
    }

    for decl in self.commands {
      let command = command_from_decl(decl, config)?;
      registry.register_command(command)?;
    }

    if !registry.contains(CLEAN_COMMAND) && !registry.has_command(CLEAN_COMMAND) {
      registry.register_command(clean_command())?;
    }

    if let Some(default) = self.options.default.or(first) {
      registry.set_default(default);
    }

    registry.validate()?;
    Ok(registry)
  }
}

/// The built-in `clean` command: forgets every recorded fingerprint.
pub fn clean_command() -> Command {
  Command::reset_fingerprints(CLEAN_COMMAND, "removes the fingerprint store")
}

fn target_from_decl(decl: TargetDecl) -> Result<Target, BuildFileError> {
  let mut target = match decl.name {
    Some(name) => Target::new(name),
    None => Target::anonymous(),
  };

  if let Some(desc) = decl.desc {
    target = target.desc(desc);
  }

  target = target.prereqs(decl.prereqs.iter().map(String::as_str));

  for pattern in decl.globs {
    if let Err(source) = glob::Pattern::new(&pattern) {
      return Err(BuildFileError::Pattern {
        target: target.name.clone(),
        pattern,
        source,
      });
    }
    target = target.lazy(move || expand_glob(&pattern));
  }

  if let Some(script) = decl.cmd {
    target = target.action(script_action(&script));
  }
  if let Some(output) = decl.output {
    target = target.output(output);
  }
  for path in decl.modifies {
    target = target.modifies(path);
  }

  Ok(target)
}

fn script_action(script: &Script) -> Action {
  match script {
    Script::One(line) => Action::shell(line.clone()),
    Script::Many(lines) => Action::sequence(lines.iter().cloned().map(Action::Shell)),
  }
}

fn command_from_decl(decl: CommandDecl, config: &MakeConfig) -> Result<Command, BuildFileError> {
  let arity = match &decl.args {
    ArgsDecl::Count(n) => Arity::Fixed(*n),
    ArgsDecl::Pattern(value) if value == "*" => Arity::Variadic,
    ArgsDecl::Pattern(value) => {
      return Err(BuildFileError::InvalidArity {
        command: decl.name,
        value: value.clone(),
      });
    }
  };

  let lines = decl.run.lines().to_vec();
  let shell = config.shell.clone();
  let timeout = config.timeout;

  Ok(Command::new(decl.name, decl.desc, arity, move |args| {
    let runner = ActionRunner::new(shell.clone(), timeout)?;
    for line in &lines {
      runner.run_shell(line, args)?;
    }
    Ok(0)
  }))
}

/// Files matching `pattern`, in the order `glob` yields them.
fn expand_glob(pattern: &str) -> Vec<Prerequisite> {
  let paths = match glob::glob(pattern) {
    Ok(paths) => paths,
    Err(e) => {
      warn!(pattern = %pattern, error = %e, "invalid glob pattern");
      return Vec::new();
    }
  };

  paths
    .filter_map(|entry| match entry {
      Ok(path) if path.is_file() => Some(Prerequisite::File(path)),
      Ok(_) => None,
      Err(e) => {
        warn!(pattern = %pattern, error = %e, "unreadable glob match");
        None
      }
    })
    .collect()
}
