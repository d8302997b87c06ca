// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process adapter backed by `tokio::process`

use super::{ProcessAdapter, ProcessError, RunningProcess, SIGNALED_EXIT_STATUS};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// How long to keep reading output after the child exits.
///
/// Grandchildren that inherited the pipes can hold them open indefinitely.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runs commands as local child processes
#[derive(Clone, Default)]
pub struct LocalProcessAdapter;

impl LocalProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessAdapter for LocalProcessAdapter {
    type Process = LocalProcess;

    async fn spawn(
        &self,
        cwd: &Path,
        command: &str,
        env: &[(String, String)],
    ) -> Result<LocalProcess, ProcessError> {
        let program = cwd.join(command);
        let mut child = Command::new(&program)
            .current_dir(cwd)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Launch {
                command: program.clone(),
                source,
            })?;

        let output = Arc::new(Mutex::new(String::new()));
        let mut readers = JoinSet::new();
        if let Some(stdout) = child.stdout.take() {
            readers.spawn(capture(stdout, Arc::clone(&output)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.spawn(capture(stderr, Arc::clone(&output)));
        }

        tracing::debug!(program = %program.display(), pid = ?child.id(), "process started");

        Ok(LocalProcess {
            child,
            output,
            readers,
            exited: None,
        })
    }
}

/// Append everything read from `reader` to `output`, a line at a time.
async fn capture<R: AsyncRead + Unpin>(reader: R, output: Arc<Mutex<String>>) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => output.lock().push_str(&String::from_utf8_lossy(&line)),
            Err(e) => {
                tracing::warn!(error = %e, "output read failed");
                break;
            }
        }
    }
}

/// A child started by [`LocalProcessAdapter`]
pub struct LocalProcess {
    child: Child,
    output: Arc<Mutex<String>>,
    readers: JoinSet<()>,
    /// Exit code and output drain deadline, fixed when the child is reaped
    exited: Option<(i32, Instant)>,
}

#[async_trait]
impl RunningProcess for LocalProcess {
    fn output(&self) -> String {
        self.output.lock().clone()
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        // A cancelled wait resumes against the same deadline
        let (exit_status, drain_deadline) = match self.exited {
            Some(exited) => exited,
            None => {
                let status = self.child.wait().await.map_err(ProcessError::Wait)?;
                let exited = (
                    status.code().unwrap_or(SIGNALED_EXIT_STATUS),
                    Instant::now() + OUTPUT_DRAIN_GRACE,
                );
                self.exited = Some(exited);
                exited
            }
        };

        let drain = async { while self.readers.join_next().await.is_some() {} };
        if tokio::time::timeout_at(drain_deadline, drain).await.is_err() {
            tracing::debug!("output still open after exit, detaching readers");
            self.readers.abort_all();
        }

        Ok(exit_status)
    }

    fn kill(&mut self) -> Result<(), ProcessError> {
        self.child.start_kill().map_err(ProcessError::Kill)
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
