//! Building targets and running commands named on the command line.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};

use koch_lib::dispatch::{Dispatched, Dispatcher};
use koch_lib::driver::{Driver, Outcome};

use super::project::Project;
use crate::output::{format_duration, print_error, print_info, print_success, print_warning};

/// Dispatch `tokens` against the loaded project.
///
/// Returns failure when any requested target or command failed. Every
/// token is attempted first.
pub fn cmd_build(project: Project, tokens: &[String]) -> Result<ExitCode> {
  let start = Instant::now();

  let driver = Driver::open(&project.registry, project.config).context("Failed to start build")?;
  let mut dispatcher = Dispatcher::new(driver);
  let report = dispatcher.run(tokens)?;

  for token in &report.skipped {
    print_warning(&format!("ignored option '{}' after first target", token));
  }

  for dispatched in &report.dispatched {
    match dispatched {
      Dispatched::Target(made) => {
        for failed in &made.failed {
          print_error(&format!("target '{}' failed: {}", failed.name, failed.error));
        }
        if made.outcome == Outcome::Failed && made.failed.is_empty() {
          print_error(&format!("target '{}' failed", made.target));
        }
      }
      Dispatched::Command(run) => {
        if let Err(err) = &run.result {
          print_error(&format!("command '{}' failed: {}", run.name, err));
        }
      }
    }
  }

  let elapsed = format_duration(start.elapsed());
  if report.is_success() {
    let built: usize = report
      .dispatched
      .iter()
      .map(|d| match d {
        Dispatched::Target(made) => made.built.len(),
        Dispatched::Command(_) => 0,
      })
      .sum();
    if built == 0 {
      print_info(&format!("Nothing to do ({})", elapsed));
    } else {
      print_success(&format!("Built {} target(s) in {}", built, elapsed));
    }
    Ok(ExitCode::SUCCESS)
  } else {
    let failures: Vec<&str> = report.failures().collect();
    print_error(&format!("Failed: {} ({})", failures.join(", "), elapsed));
    Ok(ExitCode::FAILURE)
  }
}
