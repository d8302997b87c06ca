// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script supervision.
//!
//! One task owns the child and a single interval timer. Each tick hands the
//! caller a snapshot of the output and a way to request a kill; the loop only
//! acts on the request after the callback has returned, so at most one
//! callback is ever in flight and a kill can never race process teardown.

use bk_adapters::{ProcessAdapter, ProcessError, RunningProcess};
use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};

/// Floor for the tick interval; tokio intervals must be non-zero.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from running a script
#[derive(Debug, Error)]
pub enum RunError<E> {
    #[error(transparent)]
    Launch(ProcessError),
    #[error(transparent)]
    Wait(ProcessError),
    #[error("tick callback failed: {0}")]
    Callback(E),
}

/// How a supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub output: String,
    /// Exit code, or -1 when the process was terminated by a signal
    pub exit_status: i32,
}

/// Request handle for terminating the supervised process.
#[derive(Debug, Clone, Default)]
pub(crate) struct KillSwitch {
    requested: Arc<AtomicBool>,
}

impl KillSwitch {
    /// Ask for the process to be terminated once the current callback returns.
    pub(crate) fn kill(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// What a tick callback gets to see.
#[derive(Debug, Clone)]
pub struct Tick {
    output: String,
    elapsed: Duration,
    kill: KillSwitch,
}

impl Tick {
    /// Everything the process has written so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Time since launch.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn kill(&self) {
        self.kill.kill();
    }
}

/// Start `script` with its directory as working directory.
pub async fn launch<P: ProcessAdapter>(
    adapter: &P,
    script: &Path,
    env: &[(String, String)],
) -> Result<P::Process, ProcessError> {
    let Some(name) = script.file_name().and_then(|n| n.to_str()) else {
        return Err(ProcessError::Launch {
            command: script.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "script path has no file name"),
        });
    };
    let dir = match script.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    adapter.spawn(dir, name, env).await
}

/// Supervise a launched process until it exits.
///
/// `on_tick` runs every `interval`, first one interval after this call.
/// Slow callbacks delay the next tick rather than bunching ticks up.
pub async fn supervise<R, F, Fut, E>(
    mut process: R,
    interval: Duration,
    mut on_tick: F,
) -> Result<ProcessOutcome, RunError<E>>
where
    R: RunningProcess,
    F: FnMut(Tick) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let started = Instant::now();
    let kill = KillSwitch::default();
    let mut killed = false;

    let interval = interval.max(MIN_TICK_INTERVAL);
    let mut ticker = tokio::time::interval_at(started + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            status = process.wait() => {
                let exit_status = status.map_err(RunError::Wait)?;
                return Ok(ProcessOutcome {
                    output: process.output(),
                    exit_status,
                });
            }
            _ = ticker.tick() => {
                let tick = Tick {
                    output: process.output(),
                    elapsed: started.elapsed(),
                    kill: kill.clone(),
                };
                on_tick(tick).await.map_err(RunError::Callback)?;

                if kill.is_requested() && !killed {
                    killed = true;
                    if let Err(e) = process.kill() {
                        tracing::warn!(error = %e, "kill request failed");
                    }
                }
            }
        }
    }
}

/// Launch `script` and supervise it to completion.
pub async fn run_script<P, F, Fut, E>(
    adapter: &P,
    script: &Path,
    env: &[(String, String)],
    interval: Duration,
    on_tick: F,
) -> Result<ProcessOutcome, RunError<E>>
where
    P: ProcessAdapter,
    F: FnMut(Tick) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let process = launch(adapter, script, env)
        .await
        .map_err(RunError::Launch)?;
    supervise(process, interval, on_tick).await
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
