// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::api::{ApiError, ControlPlane};
use async_trait::async_trait;
use bk_core::{Artifact, ArtifactId, Job, JobId};
use tracing::Instrument;

/// Wrapper that adds tracing to any ControlPlane
#[derive(Clone)]
pub struct TracedControlPlane<C> {
    inner: C,
}

impl<C> TracedControlPlane<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ControlPlane> ControlPlane for TracedControlPlane<C> {
    async fn next_job(&self) -> Result<Option<Job>, ApiError> {
        let result = self.inner.next_job().await;
        match &result {
            Ok(Some(job)) => tracing::info!(job_id = %job.id, state = %job.state, "job assigned"),
            Ok(None) => tracing::trace!("no job available"),
            Err(e) => tracing::error!(error = %e, "next_job failed"),
        }
        result
    }

    async fn update_job(&self, job: &Job) -> Result<Job, ApiError> {
        let span = tracing::debug_span!("api.update_job", job_id = %job.id, phase = %job.phase());
        async {
            let start = std::time::Instant::now();
            let result = self.inner.update_job(job).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(updated) => tracing::debug!(state = %updated.state, elapsed_ms, "job pushed"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "update_job failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_artifacts(
        &self,
        job_id: &JobId,
        artifacts: &[Artifact],
    ) -> Result<Vec<ArtifactId>, ApiError> {
        let span = tracing::info_span!("api.create_artifacts", %job_id, count = artifacts.len());
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create_artifacts(job_id, artifacts).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(ids) => tracing::info!(registered = ids.len(), elapsed_ms, "artifacts registered"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create_artifacts failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn update_artifact(&self, artifact: &Artifact) -> Result<(), ApiError> {
        let result = self.inner.update_artifact(artifact).await;
        tracing::info_span!("api.update_artifact", path = %artifact.path, state = %artifact.state)
            .in_scope(|| match &result {
                Ok(()) => tracing::debug!("artifact state pushed"),
                Err(e) => tracing::error!(error = %e, "update_artifact failed"),
            });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
