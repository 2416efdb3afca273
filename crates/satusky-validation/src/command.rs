//! Allow-listed local command execution.
//!
//! The deploy pipeline shells out to exactly two programs: the container
//! tool and `git`. Arguments are passed straight to the process (never
//! through `sh -c`) and each one is checked for control characters while
//! the command is being built.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), satusky_validation::command::CommandError> {
//! use satusky_validation::command::{AllowedProgram, SafeCommand};
//!
//! let output = SafeCommand::new(AllowedProgram::Git)
//!     .args(["config", "--get", "remote.origin.url"])
//!     .execute()
//!     .await?;
//! println!("{}", output.stdout_lossy().trim());
//! # Ok(())
//! # }
//! ```

use crate::error::ValidationError;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command as TokioCommand;

/// Lines of stderr kept from a streamed command for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// The only programs [`SafeCommand`] will start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AllowedProgram {
    /// The `docker` CLI, used to build and export images.
    Docker,
    /// The `git` CLI, used to read the origin remote.
    Git,
}

impl AllowedProgram {
    /// Executable name looked up on `PATH`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Git => "git",
        }
    }
}

impl fmt::Display for AllowedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to run a local tool.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An argument was rejected before the process was started.
    #[error("refusing to run: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// The program is not installed or not on `PATH`.
    #[error("'{program}' was not found; make sure it is installed and on your PATH")]
    ProgramNotFound {
        /// The program that could not be started.
        program: AllowedProgram,
    },

    /// The tool ran and failed.
    #[error("`{command}` failed with exit status {exit_code}: {stderr}")]
    NonZeroExit {
        /// Command line as run.
        command: String,
        /// Exit status, `-1` when killed by a signal.
        exit_code: i32,
        /// What the tool printed on stderr.
        stderr: String,
    },

    /// Spawning or talking to the child process failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CommandError {
    /// Builds [`CommandError::NonZeroExit`].
    #[must_use]
    pub fn non_zero_exit(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// True when the command never started because of a bad argument.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }
}

/// Control characters rejected in any argument.
const FORBIDDEN_CHARS: &[char] = &['\0', '\n', '\r'];

/// Checks one argument for embedded control characters.
///
/// # Errors
///
/// Returns an error if the argument contains a null byte or a line break.
pub fn validate_argument(arg: &str, field_name: &str) -> Result<(), ValidationError> {
    if let Some(c) = arg.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(ValidationError::shell_injection(field_name, c));
    }
    Ok(())
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Raw stdout bytes.
    pub stdout: Vec<u8>,
    /// Raw stderr bytes.
    pub stderr: Vec<u8>,
    /// Exit status, `-1` when killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Stdout decoded as UTF-8.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded as UTF-8.
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// True on exit status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A command builder that validates every argument it is given.
#[derive(Debug)]
pub struct SafeCommand {
    program: AllowedProgram,
    args: Vec<String>,
    rejected: Vec<ValidationError>,
    workdir: Option<String>,
}

impl SafeCommand {
    /// Starts building a command line for `program`.
    #[must_use]
    pub fn new(program: AllowedProgram) -> Self {
        Self {
            program,
            args: Vec::new(),
            rejected: Vec::new(),
            workdir: None,
        }
    }

    /// Appends one argument. A rejected argument is remembered and reported
    /// when the command runs.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        let arg = arg.as_ref();
        match validate_argument(arg, "argument") {
            Ok(()) => self.args.push(arg.to_string()),
            Err(e) => self.rejected.push(e),
        }
        self
    }

    /// Appends each of `args`.
    #[must_use]
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, Self::arg)
    }

    /// Runs the command from `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<str>) -> Self {
        let dir = dir.as_ref();
        match validate_argument(dir, "current_dir") {
            Ok(()) => self.workdir = Some(dir.to_string()),
            Err(e) => self.rejected.push(e),
        }
        self
    }

    /// Arguments rejected so far.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.rejected
    }

    /// The command line, for logging and error messages.
    #[must_use]
    pub fn description(&self) -> String {
        if self.args.is_empty() {
            self.program.as_str().to_string()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    fn prepare(&mut self) -> Result<TokioCommand, CommandError> {
        if !self.rejected.is_empty() {
            return Err(self.rejected.swap_remove(0).into());
        }

        let mut cmd = TokioCommand::new(self.program.as_str());
        cmd.args(&self.args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }

    fn spawn_error(&self, err: io::Error) -> CommandError {
        if err.kind() == io::ErrorKind::NotFound {
            CommandError::ProgramNotFound {
                program: self.program,
            }
        } else {
            CommandError::Io(err)
        }
    }

    /// Runs to completion with stdout and stderr captured.
    ///
    /// # Errors
    ///
    /// Returns an error if validation failed, the program could not be
    /// started, or it exited with a non-zero code.
    pub async fn execute(self) -> Result<CommandOutput, CommandError> {
        let description = self.description();
        let output = self.execute_unchecked().await?;
        if !output.success() {
            return Err(CommandError::non_zero_exit(
                description,
                output.exit_code,
                output.stderr_lossy().trim(),
            ));
        }
        Ok(output)
    }

    /// Like [`SafeCommand::execute`] but a non-zero exit is returned as output.
    ///
    /// # Errors
    ///
    /// Returns an error if validation failed or the program could not be
    /// started.
    pub async fn execute_unchecked(mut self) -> Result<CommandOutput, CommandError> {
        let mut cmd = self.prepare()?;
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        tracing::debug!(command = %self.description(), "running command");
        let output = cmd.output().await.map_err(|e| self.spawn_error(e))?;

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Runs with the tool's output shown on the terminal.
    ///
    /// Stdout is inherited. Stderr is forwarded line by line and the last
    /// lines are kept so a failure can report what the tool printed.
    ///
    /// # Errors
    ///
    /// Returns an error if validation failed, the program could not be
    /// started, or it exited with a non-zero code.
    pub async fn execute_streaming(mut self) -> Result<(), CommandError> {
        let mut cmd = self.prepare()?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        let description = self.description();
        tracing::debug!(command = %description, "running command");
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            let mut terminal = tokio::io::stderr();
            while let Some(line) = lines.next_line().await? {
                terminal.write_all(line.as_bytes()).await?;
                terminal.write_all(b"\n").await?;
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            let stderr = tail.into_iter().collect::<Vec<_>>().join("\n");
            return Err(CommandError::non_zero_exit(
                description,
                status.code().unwrap_or(-1),
                stderr,
            ));
        }
        Ok(())
    }
}
