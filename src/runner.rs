//! Command execution backend.
//!
//! Dispatch talks to a [`CommandRunner`] rather than spawning processes
//! itself, so tests can record which commands would have run.

use std::future::Future;
use std::pin::Pin;

use tokio::process::Command;

use crate::error::{HookError, Result};

/// Captured result of a process that was started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion.
    ///
    /// `Err` means the process could not be started; a process that ran and
    /// exited non-zero is an `Ok` with `success == false`.
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;
}

/// Spawns each command as an OS process.
///
/// The command string is the executable itself: no shell, no arguments, and
/// the environment is inherited from this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            let output = Command::new(command).output().await.map_err(|source| {
                HookError::CommandExecution {
                    command: command.to_string(),
                    source,
                }
            })?;

            Ok(CommandOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}
