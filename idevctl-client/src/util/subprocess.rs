//! External tool invocation using tokio::process.
//!
//! Tools share the terminal's process group, so Ctrl+C reaches them
//! directly as well as our own listener.

use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use crate::error::ClientError;

/// Builder for one invocation of an external tool.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a rendered template where the first element is the program.
    pub fn from_parts(what: &'static str, parts: Vec<String>) -> Result<Self, ClientError> {
        let mut parts = parts.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or(ClientError::EmptyCommand(what))?;
        Ok(Self::new(program).args(parts))
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run to completion and return stdout. A non-zero exit is an error
    /// carrying the tool's stderr. The child is killed if the future is dropped.
    pub async fn output(&self) -> Result<String, ClientError> {
        debug!("running {} {:?}", self.program, self.args);
        let output = self
            .command()
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ClientError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if stopped_by_ctrl_c(&output.status) {
            return Err(ClientError::Interrupted {
                program: self.program.clone(),
            });
        }
        if !output.status.success() {
            return Err(ClientError::ToolFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Spawn with stdout piped. The child is killed if the handle is dropped.
    pub fn spawn_piped(&self) -> Result<(Child, ChildStdout), ClientError> {
        debug!("spawning {} {:?}", self.program, self.args);
        let mut child = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ClientError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::MissingStdout {
                program: self.program.clone(),
            })?;
        Ok((child, stdout))
    }
}

/// Tools share our process group, so Ctrl+C reaches them too. A tool that
/// died from SIGINT was stopped by the operator, it did not fail.
pub fn stopped_by_ctrl_c(status: &ExitStatus) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.signal() == Some(libc::SIGINT)
    }
    #[cfg(not(unix))]
    {
        let _ = status;
        false
    }
}
