//! Shell command execution, either blocking with captured output or detached

use std::path::PathBuf;
use std::process::{Command as ProcessCommand, Stdio};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

use crate::catalog::CommandGroup;

/// Acknowledgement returned for a detached launch
pub const DETACHED_ACK: &str = "Process started successfully in background";

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Command failed ({status}): {output}")]
    Execution { status: ExitStatusText, output: String },
    #[error("Failed to start command: {0}")]
    Launch(#[source] std::io::Error),
}

/// Exit code of a finished process, or a note that it was terminated by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatusText(pub Option<i32>);

impl std::fmt::Display for ExitStatusText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Result of a blocking execution with captured output.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandOutput {
    /// Stdout followed by stderr, with trailing line breaks removed
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text.trim_end_matches(['\n', '\r']).to_string()
    }
}

/// Output of one command within a group run. Failures are folded into `output`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GroupRunEntry {
    pub name: String,
    pub output: String,
    pub success: bool,
}

/// Spawns shell commands with a fixed shell and working directory
#[derive(Debug, Clone)]
pub struct Runner {
    shell: String,
    shell_args: Vec<String>,
    cwd: Option<PathBuf>,
}

/// Platform shell and the arguments that make it run a command string
#[must_use]
pub fn default_shell() -> (String, Vec<String>) {
    if cfg!(windows) {
        ("cmd".to_string(), vec!["/C".to_string()])
    } else {
        ("sh".to_string(), vec!["-c".to_string()])
    }
}

impl Default for Runner {
    fn default() -> Self {
        let (shell, shell_args) = default_shell();
        Self {
            shell,
            shell_args,
            cwd: None,
        }
    }
}

impl Runner {
    #[must_use]
    pub fn new(shell: impl Into<String>, shell_args: Vec<String>, cwd: Option<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            shell_args,
            cwd,
        }
    }

    fn build(&self, command: &str) -> ProcessCommand {
        debug!("Building command '{command}' with {}", self.shell);
        let mut process = ProcessCommand::new(&self.shell);
        process.args(&self.shell_args).arg(command);
        if let Some(ref cwd) = self.cwd {
            process.current_dir(cwd);
        }
        process
    }

    /// Run a command to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Launch` if the shell cannot be spawned, or
    /// `RunError::Execution` with the captured output on a non-zero exit.
    pub fn execute(&self, command: &str) -> Result<CommandOutput, RunError> {
        let start = Instant::now();
        let output = self
            .build(command)
            .stdin(Stdio::null())
            .output()
            .map_err(RunError::Launch)?;
        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        };

        if output.status.success() {
            debug!("Command '{command}' finished in {:?}", result.duration);
            Ok(result)
        } else {
            warn!(
                "Command '{command}' failed with {}",
                ExitStatusText(result.exit_code)
            );
            Err(RunError::Execution {
                status: ExitStatusText(result.exit_code),
                output: result.combined(),
            })
        }
    }

    /// Launch a command without waiting for it.
    ///
    /// There is no handle to the child: its exit and output are never reported. A
    /// background thread reaps it so it does not linger as a zombie.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Launch` if the process cannot be spawned.
    pub fn execute_detached(&self, command: &str) -> Result<String, RunError> {
        let mut child = self
            .build(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(RunError::Launch)?;
        let pid = child.id();
        info!("Started detached command '{command}' (pid {pid})");

        let spawned = std::thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || match child.wait() {
                Ok(status) => debug!("Detached process {pid} exited: {status}"),
                Err(e) => debug!("Failed to wait for detached process {pid}: {e}"),
            });
        if let Err(e) = spawned {
            warn!("Detached process {pid} will not be reaped: {e}");
        }

        Ok(DETACHED_ACK.to_string())
    }

    /// Run a single command, honouring its detached flag, and fold the outcome into text.
    #[must_use]
    pub fn run_to_text(&self, command: &str, is_detached: bool) -> (bool, String) {
        let result = if is_detached {
            self.execute_detached(command)
        } else {
            self.execute(command).map(|output| output.combined())
        };
        match result {
            Ok(output) => (true, output),
            Err(e) => (false, format!("Error: {e}")),
        }
    }

    /// Run every command of a group in stored order.
    ///
    /// A failing command does not stop the sequence; its error becomes its output.
    #[must_use]
    pub fn execute_group(&self, group: &CommandGroup) -> Vec<GroupRunEntry> {
        info!(
            "Running group '{}' ({} commands)",
            group.name,
            group.commands.len()
        );
        group
            .commands
            .iter()
            .map(|cmd| {
                let (success, output) = self.run_to_text(&cmd.command, cmd.is_detached);
                GroupRunEntry {
                    name: cmd.name.clone(),
                    output,
                    success,
                }
            })
            .collect()
    }
}
