use anyhow::Result;
use clap::Command;

use koch_lib::target::Registry;

use crate::output::format_listing;

/// Print usage, followed by the described targets and the commands of
/// `registry` when a build file could be loaded.
pub fn cmd_help(mut command: Command, registry: Option<&Registry>) -> Result<()> {
  if let Some(registry) = registry {
    let sections: Vec<String> = [
      format_listing("Available targets", registry.described_targets()),
      format_listing(
        "Available commands",
        registry.commands().map(|c| (c.name.as_str(), c.desc.as_str())),
      ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if !sections.is_empty() {
      command = command.after_help(sections.join("\n\n"));
    }
  }

  command.print_help()?;
  Ok(())
}
