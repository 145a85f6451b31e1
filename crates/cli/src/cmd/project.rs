//! Locating and loading the build file.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use koch_lib::buildfile::BuildFile;
use koch_lib::driver::MakeConfig;
use koch_lib::target::Registry;

/// A loaded build file, ready to build.
pub struct Project {
  pub registry: Registry,
  pub config: MakeConfig,
}

/// Change into the directory of `file` and load it.
///
/// Relative paths in the build file, including the fingerprint store, are
/// resolved against that directory.
pub fn load_project(file: &Path, mut config: MakeConfig) -> Result<Project> {
  if !file.is_file() {
    bail!("Build file not found: {}", file.display());
  }

  if let Some(dir) = file.parent()
    && !dir.as_os_str().is_empty()
  {
    std::env::set_current_dir(dir).with_context(|| format!("Failed to change into {}", dir.display()))?;
    debug!(dir = %dir.display(), "changed working directory");
  }

  let name = file
    .file_name()
    .with_context(|| format!("Not a file: {}", file.display()))?;
  let build_file = BuildFile::load(Path::new(name))?;

  build_file.apply_options(&mut config);
  let config = config.with_env_overrides();
  let registry = build_file.into_registry(&config)?;

  Ok(Project { registry, config })
}
