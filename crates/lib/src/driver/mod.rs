//! Incremental build driver.
//!
//! The driver walks the target graph depth first from a requested target,
//! decides per target whether it is stale, runs the build actions of stale
//! targets and records fingerprints of successful builds. It handles:
//! - Memoized resolution, so shared prerequisites are resolved once per `make`
//! - Failure propagation by outcome dominance instead of early return
//! - Staged fingerprints, committed only after a successful build
//! - Persisting the fingerprint store after every `make`

mod outcome;
mod types;

use std::collections::HashMap;

use tracing::{debug, error, info};

use crate::action::ActionRunner;
use crate::fingerprint::FingerprintStore;
use crate::lock::BuildLock;
use crate::target::{Prerequisite, Registry, Target};

pub use outcome::Outcome;
pub use types::{DriverError, FailedTarget, MakeConfig, MakeReport};

/// A build session over one registry and one fingerprint store.
///
/// The driver owns the fingerprint store for its whole lifetime; with
/// [`MakeConfig::lock`] set it also holds the store's advisory lock until
/// dropped.
pub struct Driver<'r> {
  registry: &'r Registry,
  store: FingerprintStore,
  runner: ActionRunner,
  config: MakeConfig,
  /// Outcomes of targets already resolved during the current `make`.
  memo: HashMap<String, Outcome>,
  /// Targets currently being resolved, outermost first.
  in_progress: Vec<String>,
  report: Option<MakeReport>,
  _lock: Option<BuildLock>,
}

impl<'r> Driver<'r> {
  /// Open a session: take the lock, load the fingerprint store and prepare
  /// the action runner.
  pub fn open(registry: &'r Registry, config: MakeConfig) -> Result<Self, DriverError> {
    let lock = if config.lock {
      Some(BuildLock::acquire(&config.fingerprints, &config.invocation)?)
    } else {
      None
    };

    let store = FingerprintStore::load(&config.fingerprints)?;
    let runner = ActionRunner::new(config.shell.clone(), config.timeout)?;

    debug!(
      fingerprints = %config.fingerprints.display(),
      force = config.force,
      explain = config.explain,
      "opened build session"
    );

    Ok(Self {
      registry,
      store,
      runner,
      config,
      memo: HashMap::new(),
      in_progress: Vec::new(),
      report: None,
      _lock: lock,
    })
  }

  pub fn config(&self) -> &MakeConfig {
    &self.config
  }

  pub fn store(&self) -> &FingerprintStore {
    &self.store
  }

  pub fn registry(&self) -> &'r Registry {
    self.registry
  }

  /// Bring `target` (or the default target) up to date and persist the
  /// fingerprint store.
  ///
  /// Build failures are reported through [`MakeReport::outcome`]. An `Err`
  /// means the build description itself is broken or the store could not
  /// be written. The store is saved in both cases.
  pub fn make(&mut self, target: Option<&str>) -> Result<MakeReport, DriverError> {
    let name = match target {
      Some(name) => name,
      None => self.registry.default_target().ok_or(DriverError::NoDefaultTarget)?,
    }
    .to_string();

    if !self.registry.contains(&name) {
      return Err(DriverError::UnknownTarget(name));
    }

    self.memo.clear();
    self.in_progress.clear();
    // an earlier make that stopped on a fatal error may have left entries staged
    self.store.discard_all();
    self.report = Some(MakeReport::new(&name));

    let resolved = self.resolve(&name);
    let saved = self.store.save();
    let mut report = self.report.take().unwrap_or_else(|| MakeReport::new(&name));

    let outcome = match (resolved, saved) {
      (Ok(outcome), Ok(())) => outcome,
      (Ok(_), Err(err)) => return Err(err.into()),
      (Err(err), saved) => {
        if let Err(save_err) = saved {
          error!(error = %save_err, "failed to save fingerprints");
        }
        return Err(err);
      }
    };

    report.outcome = outcome;
    info!(
      name = %name,
      outcome = %outcome,
      built = report.built.len(),
      failed = report.failed.len(),
      "make finished"
    );
    Ok(report)
  }

  /// Forget every recorded fingerprint, in memory and on disk.
  ///
  /// Targets made afterwards in this session see all their files as
  /// changed. Returns whether a store file was removed.
  pub fn clean(&mut self) -> Result<bool, DriverError> {
    self.memo.clear();
    Ok(self.store.clear()?)
  }

  fn resolve(&mut self, name: &str) -> Result<Outcome, DriverError> {
    if let Some(&outcome) = self.memo.get(name) {
      return Ok(outcome);
    }

    let registry = self.registry;
    let Some(target) = registry.get(name) else {
      return Ok(Outcome::UpToDate);
    };

    if let Some(pos) = self.in_progress.iter().position(|n| n == name) {
      let mut path = self.in_progress[pos..].to_vec();
      path.push(name.to_string());
      return Err(DriverError::Cycle { path });
    }

    self.in_progress.push(name.to_string());
    let outcome = self.resolve_target(target);
    self.in_progress.pop();
    let outcome = outcome?;

    self.memo.insert(name.to_string(), outcome);
    Ok(outcome)
  }

  fn resolve_target(&mut self, target: &Target) -> Result<Outcome, DriverError> {
    let name = target.name.as_str();
    let mut outcome = Outcome::UpToDate;

    for prerequisite in expand(&target.prerequisites) {
      match prerequisite {
        Prerequisite::Target(dep) => {
          if !self.registry.contains(&dep) {
            return Err(DriverError::UnknownReference {
              target: name.to_string(),
              reference: dep,
            });
          }
          let dep_outcome = self.resolve(&dep)?;
          outcome = outcome.aggregate(dep_outcome);
          match dep_outcome {
            Outcome::Updated => {
              self.explain(format!("will build '{name}' because '#{dep}' modified since last build"));
            }
            Outcome::Failed => {
              self.explain(format!("cannot build '{name}' because '#{dep}' failed"));
            }
            Outcome::UpToDate => {}
          }
        }
        Prerequisite::File(path) => {
          if self.store.has_changed(name, &path) {
            self.explain(format!(
              "will build '{name}' because '{}' modified since last build",
              path.display()
            ));
            outcome = outcome.aggregate(Outcome::Updated);
          }
        }
        // already flattened by `expand`
        Prerequisite::Lazy(_) => {}
      }
    }

    if let Some(output) = &target.output
      && !output.exists()
    {
      self.explain(format!(
        "will build '{name}' because output file '{}' does not exist",
        output.display()
      ));
      outcome = outcome.aggregate(Outcome::Updated);
    }

    if outcome == Outcome::UpToDate && self.config.force {
      self.explain(format!("will build '{name}' because forced"));
      outcome = Outcome::Updated;
    }

    match outcome {
      Outcome::Updated => {
        info!("building target '{}'", name);
        if let Err(err) = self.runner.run(&target.action) {
          error!(name = %name, error = %err, "target '{}' failed", name);
          self.record(|report| {
            report.failed.push(FailedTarget {
              name: name.to_string(),
              error: err,
            })
          });
          outcome = Outcome::Failed;
        }
      }
      Outcome::UpToDate => info!("'{}' is up to date", name),
      Outcome::Failed => debug!(name = %name, "skipping build, a prerequisite failed"),
    }

    if outcome == Outcome::Updated {
      for path in &target.modifies {
        self.store.has_changed(name, path);
      }
      self.store.commit(name);
      self.record(|report| report.built.push(name.to_string()));
    } else {
      self.store.discard(name);
      if outcome == Outcome::UpToDate {
        self.record(|report| report.up_to_date.push(name.to_string()));
      }
    }

    Ok(outcome)
  }

  fn explain(&mut self, message: String) {
    if !self.config.explain {
      return;
    }
    info!("{}", message);
    self.record(|report| report.explanations.push(message));
  }

  fn record(&mut self, f: impl FnOnce(&mut MakeReport)) {
    if let Some(report) = self.report.as_mut() {
      f(report);
    }
  }
}

/// Flatten a prerequisite list, expanding lazy entries in place.
fn expand(prerequisites: &[Prerequisite]) -> Vec<Prerequisite> {
  let mut expanded = Vec::with_capacity(prerequisites.len());
  for prerequisite in prerequisites {
    match prerequisite {
      Prerequisite::Lazy(lazy) => expanded.extend(expand(&lazy.expand())),
      other => expanded.push(other.clone()),
    }
  }
  expanded
}
