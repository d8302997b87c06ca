// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
//!
//! Processes follow a [`FakeScript`] on the tokio clock, so tests using
//! `start_paused = true` see fully deterministic output and exit timing.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessAdapter, ProcessError, RunningProcess, SIGNALED_EXIT_STATUS};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Recorded process call
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessCall {
    Spawn {
        cwd: PathBuf,
        command: String,
        env: Vec<(String, String)>,
    },
    /// Kill requested `after` the process started
    Kill { after: Duration },
}

/// Scripted behavior for one fake process
#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    /// Output chunks and the offset from launch at which each appears
    pub output: Vec<(Duration, String)>,
    /// Time until natural exit
    pub runtime: Duration,
    pub exit_status: i32,
    /// Fail the spawn with this message instead of starting
    pub launch_error: Option<String>,
}

impl FakeScript {
    /// A process that runs for `runtime` and exits with `exit_status`.
    pub fn exits(runtime: Duration, exit_status: i32) -> Self {
        Self {
            runtime,
            exit_status,
            ..Self::default()
        }
    }

    /// A process that cannot be launched.
    pub fn fails_to_launch(message: &str) -> Self {
        Self {
            launch_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Emit `text` at `offset` after launch.
    pub fn with_output(mut self, offset: Duration, text: &str) -> Self {
        self.output.push((offset, text.to_string()));
        self
    }
}

struct FakeProcessState {
    scripts: VecDeque<FakeScript>,
    calls: Vec<ProcessCall>,
}

/// Fake process adapter for testing
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                scripts: VecDeque::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the behavior of the next spawned process.
    ///
    /// With an empty queue, spawned processes exit 0 immediately.
    pub fn push_script(&self, script: FakeScript) {
        self.inner.lock().scripts.push_back(script);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Offsets at which kills were requested.
    pub fn kills(&self) -> Vec<Duration> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ProcessCall::Kill { after } => Some(*after),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    type Process = FakeProcess;

    async fn spawn(
        &self,
        cwd: &Path,
        command: &str,
        env: &[(String, String)],
    ) -> Result<FakeProcess, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Spawn {
            cwd: cwd.to_path_buf(),
            command: command.to_string(),
            env: env.to_vec(),
        });
        let script = inner.scripts.pop_front().unwrap_or_default();

        if let Some(message) = script.launch_error {
            return Err(ProcessError::Launch {
                command: cwd.join(command),
                source: io::Error::new(io::ErrorKind::NotFound, message),
            });
        }

        Ok(FakeProcess {
            adapter: Arc::clone(&self.inner),
            started: Instant::now(),
            killed_at: None,
            kill: Arc::new(Notify::new()),
            script,
        })
    }
}

/// A process started by [`FakeProcessAdapter`]
pub struct FakeProcess {
    adapter: Arc<Mutex<FakeProcessState>>,
    started: Instant,
    killed_at: Option<Duration>,
    kill: Arc<Notify>,
    script: FakeScript,
}

#[async_trait]
impl RunningProcess for FakeProcess {
    fn output(&self) -> String {
        let elapsed = self.killed_at.unwrap_or_else(|| self.started.elapsed());
        self.script
            .output
            .iter()
            .filter(|(offset, _)| *offset <= elapsed)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        if self.killed_at.is_some() {
            return Ok(SIGNALED_EXIT_STATUS);
        }
        tokio::select! {
            _ = tokio::time::sleep_until(self.started + self.script.runtime) => {
                Ok(self.script.exit_status)
            }
            _ = self.kill.notified() => Ok(SIGNALED_EXIT_STATUS),
        }
    }

    fn kill(&mut self) -> Result<(), ProcessError> {
        let after = self.started.elapsed();
        self.adapter.lock().calls.push(ProcessCall::Kill { after });
        if after < self.script.runtime && self.killed_at.is_none() {
            self.killed_at = Some(after);
            self.kill.notify_one();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
