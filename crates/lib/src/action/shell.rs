//! Shell command execution.
//!
//! Commands run through the platform shell with the caller's environment,
//! working directory and stdio, so build tools behave exactly as they would
//! when typed by hand.

use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use super::types::ActionError;
use crate::consts::APP_NAME;

/// Run `cmd` through the shell and wait for it to finish.
///
/// `args` become the shell's positional parameters (`$1`, `$2`, ...) on
/// Unix-style shells and are appended to the command line otherwise.
/// When `timeout` is set and expires, the child is killed and the command
/// counts as failed.
pub async fn execute_shell(
  cmd: &str,
  args: &[String],
  shell: Option<&str>,
  timeout: Option<Duration>,
) -> Result<(), ActionError> {
  info!("{}", cmd);

  let (shell_cmd, shell_args, positional) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command.args(&shell_args).kill_on_drop(true);

  if positional {
    command.arg(cmd);
    if !args.is_empty() {
      // `$0` for the script
      command.arg(APP_NAME).args(args);
    }
  } else {
    let mut line = cmd.to_string();
    for arg in args {
      line.push(' ');
      line.push_str(arg);
    }
    command.arg(line);
  }

  debug!(shell = %shell_cmd, args = ?args, "spawning process");

  let mut child = command.spawn().map_err(|source| ActionError::Spawn {
    cmd: cmd.to_string(),
    source,
  })?;

  let waited = match timeout {
    Some(limit) => {
      let waited = tokio::time::timeout(limit, child.wait()).await;
      match waited {
        Ok(waited) => waited,
        Err(_) => {
          // Best effort: the child may have exited in the meantime.
          let _ = child.kill().await;
          return Err(ActionError::TimedOut {
            cmd: cmd.to_string(),
            timeout: limit,
          });
        }
      }
    }
    None => child.wait().await,
  };

  let status = waited.map_err(|source| ActionError::Spawn {
    cmd: cmd.to_string(),
    source,
  })?;

  if !status.success() {
    return Err(ActionError::ShellFailed {
      cmd: cmd.to_string(),
      code: status.code(),
    });
  }

  Ok(())
}

/// Get the shell command and arguments for the current platform.
///
/// Returns `(shell, flags, positional)` where `positional` tells whether the
/// shell accepts extra arguments as positional parameters after the script.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>, bool) {
  if let Some(shell) = override_shell {
    if shell.contains("powershell") || shell.contains("pwsh") {
      return (
        shell.to_string(),
        vec!["-NoProfile".to_string(), "-Command".to_string()],
        false,
      );
    }
    if shell.contains("cmd") {
      return (shell.to_string(), vec!["/C".to_string()], false);
    }
    // Assume Unix-style shell (bash, sh, zsh, etc.)
    return (shell.to_string(), vec!["-c".to_string()], true);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()], true)
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()], false)
  }
}
