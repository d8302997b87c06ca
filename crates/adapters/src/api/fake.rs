// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake control plane for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ApiError, ControlPlane};
use async_trait::async_trait;
use bk_core::{Artifact, ArtifactId, Job, JobId, STATE_CANCELED};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Recorded control-plane call
#[derive(Debug, Clone)]
pub enum ApiCall {
    NextJob,
    UpdateJob { job: Job },
    CreateArtifacts { job_id: JobId, artifacts: Vec<Artifact> },
    UpdateArtifact { artifact: Artifact },
}

struct FakeControlPlaneState {
    jobs: VecDeque<Job>,
    calls: Vec<ApiCall>,
    job_updates: usize,
    cancel_after_updates: Option<usize>,
    fail_updates_from: Option<usize>,
    fail_create_artifacts: bool,
    fail_artifact_updates: HashSet<String>,
    registered: usize,
}

/// In-memory control server.
///
/// Job updates are echoed back with state `running` until a configured
/// cancellation point, after which the echo carries `canceled`.
#[derive(Clone)]
pub struct FakeControlPlane {
    inner: Arc<Mutex<FakeControlPlaneState>>,
}

impl Default for FakeControlPlane {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeControlPlaneState {
                jobs: VecDeque::new(),
                calls: Vec::new(),
                job_updates: 0,
                cancel_after_updates: None,
                fail_updates_from: None,
                fail_create_artifacts: false,
                fail_artifact_updates: HashSet::new(),
                registered: 0,
            })),
        }
    }
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job for `next_job`.
    pub fn push_job(&self, job: Job) {
        self.inner.lock().jobs.push_back(job);
    }

    /// From the `n`th job update (1-based) on, echo the job as canceled.
    pub fn cancel_after_updates(&self, n: usize) {
        self.inner.lock().cancel_after_updates = Some(n);
    }

    /// From the `n`th job update (1-based) on, fail with HTTP 500.
    pub fn fail_updates_from(&self, n: usize) {
        self.inner.lock().fail_updates_from = Some(n);
    }

    /// Reject the batch registration call.
    pub fn fail_create_artifacts(&self) {
        self.inner.lock().fail_create_artifacts = true;
    }

    /// Reject state updates for the artifact at `path`.
    pub fn fail_artifact_update(&self, path: &str) {
        self.inner.lock().fail_artifact_updates.insert(path.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().calls.clone()
    }

    /// Every job snapshot pushed through `update_job`, in order.
    pub fn job_updates(&self) -> Vec<Job> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::UpdateJob { job } => Some(job.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every artifact reported through `update_artifact`, in call order.
    pub fn artifact_updates(&self) -> Vec<Artifact> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::UpdateArtifact { artifact } => Some(artifact.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn next_job(&self) -> Result<Option<Job>, ApiError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ApiCall::NextJob);
        Ok(inner.jobs.pop_front())
    }

    async fn update_job(&self, job: &Job) -> Result<Job, ApiError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ApiCall::UpdateJob { job: job.clone() });
        inner.job_updates += 1;
        let n = inner.job_updates;

        if inner.fail_updates_from.is_some_and(|from| n >= from) {
            return Err(ApiError::Status {
                status: 500,
                body: "update rejected".to_string(),
            });
        }

        let mut echo = job.clone();
        echo.state = match inner.cancel_after_updates {
            Some(at) if n >= at => STATE_CANCELED.to_string(),
            _ => "running".to_string(),
        };
        Ok(echo)
    }

    async fn create_artifacts(
        &self,
        job_id: &JobId,
        artifacts: &[Artifact],
    ) -> Result<Vec<ArtifactId>, ApiError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ApiCall::CreateArtifacts {
            job_id: job_id.clone(),
            artifacts: artifacts.to_vec(),
        });
        if inner.fail_create_artifacts {
            return Err(ApiError::Status {
                status: 422,
                body: "registration rejected".to_string(),
            });
        }
        Ok(artifacts
            .iter()
            .map(|_| {
                inner.registered += 1;
                ArtifactId::new(format!("artifact-{}", inner.registered))
            })
            .collect())
    }

    async fn update_artifact(&self, artifact: &Artifact) -> Result<(), ApiError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ApiCall::UpdateArtifact {
            artifact: artifact.clone(),
        });
        if artifact.id.is_none() {
            return Err(ApiError::Unregistered(artifact.path.clone()));
        }
        if inner.fail_artifact_updates.contains(&artifact.path) {
            return Err(ApiError::Status {
                status: 500,
                body: format!("cannot update {}", artifact.path),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
