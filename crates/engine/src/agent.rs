// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One iteration of the agent loop: fetch a job, run it, upload its artifacts.

use crate::artifact::ArtifactUploader;
use crate::job::{JobError, JobRunner};
use bk_adapters::{ControlPlane, ProcessAdapter, TransportProvider};
use bk_core::{Clock, Job};
use std::path::PathBuf;

/// Result of one poll.
#[derive(Debug)]
pub enum Poll {
    /// No job was available (or the server could not be reached)
    Idle,
    /// A job ran to completion
    Ran(Box<Job>),
}

/// Ties the job runner and the artifact uploader together.
pub struct Agent<C, P, K, T> {
    jobs: JobRunner<C, P, K>,
    uploader: ArtifactUploader<C, T>,
    build_dir: PathBuf,
}

impl<C, P, K, T> Agent<C, P, K, T>
where
    C: ControlPlane,
    P: ProcessAdapter,
    K: Clock,
    T: TransportProvider,
{
    /// Artifacts are collected relative to `build_dir`.
    pub fn new(
        jobs: JobRunner<C, P, K>,
        uploader: ArtifactUploader<C, T>,
        build_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            jobs,
            uploader,
            build_dir: build_dir.into(),
        }
    }

    /// Fetch and run at most one job.
    ///
    /// Only a broken control channel during a run is returned as an error;
    /// everything else is logged and the loop carries on.
    pub async fn poll_once(&self) -> Result<Poll, JobError> {
        let job = match self.jobs.api().next_job().await {
            Ok(Some(job)) => job,
            Ok(None) => return Ok(Poll::Idle),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch next job");
                return Ok(Poll::Idle);
            }
        };

        let job = match self.jobs.run(job).await {
            Ok(job) => job,
            Err(JobError::Push { job, source, .. }) => {
                tracing::error!(job_id = %job.id, error = %source, "failed to report finished job");
                *job
            }
            Err(e) => return Err(e),
        };

        self.upload_artifacts(&job).await;
        Ok(Poll::Ran(Box::new(job)))
    }

    async fn upload_artifacts(&self, job: &Job) {
        let Some(paths) = job.artifact_paths() else {
            return;
        };
        if let Err(e) = self
            .uploader
            .upload(&job.id, paths, job.artifact_destination(), &self.build_dir)
            .await
        {
            tracing::error!(job_id = %job.id, error = %e, "artifact upload failed");
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
