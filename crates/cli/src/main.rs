mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use koch_lib::consts::BUILD_FILENAME;
use koch_lib::driver::MakeConfig;

use cmd::{cmd_build, cmd_help, load_project};
use output::print_error;

/// Incremental build orchestrator
#[derive(Parser)]
#[command(name = "koch")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
  /// Rebuild every target regardless of fingerprints
  #[arg(short = 'f', long, short_aliases = ['b', 'B'])]
  force: bool,

  /// Explain why each target is built
  #[arg(short, long)]
  explain: bool,

  /// Build file to read
  #[arg(short = 'F', long, default_value = BUILD_FILENAME)]
  file: PathBuf,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,

  /// Show this help, including the targets and commands of the build file
  #[arg(short, long, action = ArgAction::SetTrue)]
  help: bool,

  /// Targets and commands to run, in order; commands take the following
  /// tokens as arguments
  #[arg(value_name = "TARGET|COMMAND", trailing_var_arg = true)]
  tokens: Vec<String>,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<ExitCode> {
  let config = MakeConfig {
    force: cli.force,
    explain: cli.explain,
    invocation: invocation(&cli.tokens),
    ..MakeConfig::default()
  };

  if cli.help {
    let project = load_project(&cli.file, config).ok();
    cmd_help(Cli::command(), project.as_ref().map(|p| &p.registry))?;
    return Ok(ExitCode::SUCCESS);
  }

  let project = load_project(&cli.file, config)?;
  cmd_build(project, &cli.tokens)
}

fn init_tracing(verbose: bool) {
  let default = if verbose {
    "koch=debug,koch_lib=debug"
  } else {
    "koch=info,koch_lib=info"
  };

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
    .with_target(false)
    .without_time()
    .init();
}

fn invocation(tokens: &[String]) -> String {
  std::iter::once("koch")
    .chain(tokens.iter().map(String::as_str))
    .collect::<Vec<_>>()
    .join(" ")
}
