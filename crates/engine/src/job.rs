// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle driver.
//!
//! `Fetched -> Started -> Running -> Finalizing -> Done`. The start push is
//! best effort, a push failure while running is fatal, and the final push
//! failure is reported to the caller after the job is already `Done`.

use crate::process::{self, RunError};
use bk_adapters::{ApiError, ControlPlane, ProcessAdapter, SIGNALED_EXIT_STATUS};
use bk_core::{Clock, Job, JobId, PhaseError};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

/// Interval between live status pushes when none is configured.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Errors from running a job
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    InvalidTransition(#[from] PhaseError),
    #[error("lost the control channel while job {job_id} was running: {source}")]
    ControlChannel {
        job_id: JobId,
        #[source]
        source: ApiError,
    },
    #[error("failed to report the final state of job {job_id}: {source}")]
    Push {
        job_id: JobId,
        #[source]
        source: ApiError,
        /// The finished job, as it would have been reported
        job: Box<Job>,
    },
}

impl JobError {
    /// True when the agent can no longer trust its connection to the server.
    pub fn is_fatal(&self) -> bool {
        matches!(self, JobError::ControlChannel { .. })
    }
}

/// Runs jobs through the bootstrap script, one at a time.
pub struct JobRunner<C, P, K> {
    api: C,
    processes: P,
    clock: K,
    bootstrap_script: PathBuf,
    tick_interval: Duration,
}

impl<C, P, K> JobRunner<C, P, K>
where
    C: ControlPlane,
    P: ProcessAdapter,
    K: Clock,
{
    pub fn new(api: C, processes: P, clock: K, bootstrap_script: impl Into<PathBuf>) -> Self {
        Self {
            api,
            processes,
            clock,
            bootstrap_script: bootstrap_script.into(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    /// Run `job` to completion and hand it back in the `Done` phase.
    pub async fn run(&self, job: Job) -> Result<Job, JobError> {
        let span = tracing::info_span!("job", job_id = %job.id);
        self.run_inner(job).instrument(span).await
    }

    async fn run_inner(&self, mut job: Job) -> Result<Job, JobError> {
        tracing::info!("Starting job");

        job.mark_started(self.clock.rfc3339())?;
        if let Err(e) = self.api.update_job(&job).await {
            tracing::warn!(error = %e, "failed to report job start");
        }

        let env = job.env_pairs();
        match process::launch(&self.processes, &self.bootstrap_script, &env).await {
            Ok(child) => {
                job.mark_running()?;
                job = self.supervise(job, child).await?;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to launch bootstrap script");
                job.record_launch_failure(&e.to_string())?;
            }
        }

        job.mark_finished(self.clock.rfc3339())?;
        if let Err(source) = self.api.update_job(&job).await {
            return Err(JobError::Push {
                job_id: job.id.clone(),
                source,
                job: Box::new(job),
            });
        }

        tracing::info!(exit_status = job.exit_status.as_deref().unwrap_or(""), "Finished job");
        Ok(job)
    }

    /// `Running -> Finalizing`: stream output and watch for cancellation.
    async fn supervise(&self, job: Job, child: P::Process) -> Result<Job, JobError> {
        let shared = Mutex::new(job);
        let api = &self.api;

        let result = process::supervise(child, self.tick_interval, |tick| {
            let snapshot = {
                let mut job = shared.lock();
                job.record_output(tick.output());
                job.clone()
            };
            async move {
                let updated = api.update_job(&snapshot).await?;
                if updated.is_canceled() {
                    tracing::info!("Cancelling job");
                    tick.kill();
                }
                Ok::<_, ApiError>(())
            }
        })
        .await;

        let mut job = shared.into_inner();
        match result {
            Ok(outcome) => job.record_exit(outcome.output, outcome.exit_status)?,
            Err(RunError::Callback(source)) => {
                return Err(JobError::ControlChannel {
                    job_id: job.id.clone(),
                    source,
                });
            }
            Err(RunError::Launch(e) | RunError::Wait(e)) => {
                tracing::error!(error = %e, "lost track of the bootstrap process");
                let output = format!("{}\n{}", job.output, e);
                job.record_exit(output, SIGNALED_EXIT_STATUS)?;
            }
        }
        Ok(job)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
