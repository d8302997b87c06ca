// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process adapters

mod local;

pub use local::{LocalProcess, LocalProcessAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcess, FakeProcessAdapter, FakeScript, ProcessCall};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Exit status reported for a process that was terminated by a signal.
pub const SIGNALED_EXIT_STATUS: i32 = -1;

/// Errors from process adapters
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {}: {source}", command.display())]
    Launch {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("failed to kill process: {0}")]
    Kill(#[source] std::io::Error),
}

/// Starts external commands.
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    type Process: RunningProcess;

    /// Start `command` (a file name inside `cwd`) with `cwd` as working directory.
    ///
    /// `env` is overlaid on the agent's own environment.
    async fn spawn(
        &self,
        cwd: &Path,
        command: &str,
        env: &[(String, String)],
    ) -> Result<Self::Process, ProcessError>;
}

/// A launched child process.
#[async_trait]
pub trait RunningProcess: Send {
    /// Snapshot of everything captured from stdout and stderr so far.
    fn output(&self) -> String;

    /// Wait for exit. Returns the exit code, or [`SIGNALED_EXIT_STATUS`]
    /// when the process was killed by a signal. Cancel safe.
    async fn wait(&mut self) -> Result<i32, ProcessError>;

    /// Ask the process to terminate. Does not wait for it to exit.
    fn kill(&mut self) -> Result<(), ProcessError>;
}
