// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload coordinator.
//!
//! Configuration and registration errors fail fast. Per-artifact upload and
//! state-push errors are collected under the pool lock and surface as one
//! aggregate failure once every artifact has been attempted.

use super::collect::{collect, CollectError};
use crate::pool::{WorkerPool, DEFAULT_MAX_CONCURRENCY};
use bk_adapters::{ApiError, ControlPlane, Transport, TransportError, TransportProvider};
use bk_core::{Artifact, ArtifactState, Destination, DestinationError, JobId};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// A single artifact that did not make it.
#[derive(Debug, Error)]
pub enum ArtifactFailure {
    #[error("uploading {path} failed: {source}")]
    Upload {
        path: String,
        #[source]
        source: TransportError,
    },
    #[error("reporting state of {path} failed: {source}")]
    StateUpdate {
        path: String,
        #[source]
        source: ApiError,
    },
}

/// Errors from the upload phase
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Destination(#[from] DestinationError),
    #[error("failed to prepare upload transport: {0}")]
    Setup(#[source] TransportError),
    #[error("failed to register artifacts: {0}")]
    Register(#[source] ApiError),
    #[error("There were errors with uploading some of the artifacts ({} failed)", failures.len())]
    Incomplete { failures: Vec<ArtifactFailure> },
}

/// What the upload tasks report back through the pool.
#[derive(Default)]
struct BatchState {
    failures: Vec<ArtifactFailure>,
    /// Finished artifacts keyed by their manifest position
    artifacts: Vec<(usize, Artifact)>,
}

/// Collects a job's artifacts and uploads them through a transport.
pub struct ArtifactUploader<C, T> {
    api: C,
    transports: T,
    max_concurrency: usize,
}

impl<C, T> ArtifactUploader<C, T>
where
    C: ControlPlane,
    T: TransportProvider,
{
    pub fn new(api: C, transports: T) -> Self {
        Self {
            api,
            transports,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Collect `paths` under `base_dir` and upload every match to `destination`.
    ///
    /// Returns the artifacts in their final state, in manifest order. Zero
    /// matches is a success.
    pub async fn upload(
        &self,
        job_id: &JobId,
        paths: &str,
        destination: &str,
        base_dir: &Path,
    ) -> Result<Vec<Artifact>, UploadError> {
        let span = tracing::info_span!("upload", %job_id);
        self.upload_inner(job_id, paths, destination, base_dir)
            .instrument(span)
            .await
    }

    async fn upload_inner(
        &self,
        job_id: &JobId,
        paths: &str,
        destination: &str,
        base_dir: &Path,
    ) -> Result<Vec<Artifact>, UploadError> {
        let mut artifacts = collect(job_id, paths, base_dir)?;
        if artifacts.is_empty() {
            tracing::info!("No files matched paths: {}", paths);
            return Ok(artifacts);
        }
        tracing::info!("Found {} files that match \"{}\"", artifacts.len(), paths);

        let destination = Destination::parse(destination)?;
        let mut transport = self
            .transports
            .transport(&destination)
            .map_err(UploadError::Setup)?;
        transport
            .setup(&destination)
            .await
            .map_err(UploadError::Setup)?;
        let transport: Arc<dyn Transport> = Arc::from(transport);

        for artifact in &mut artifacts {
            artifact.url = transport.url(artifact);
        }

        let ids = self
            .api
            .create_artifacts(job_id, &artifacts)
            .await
            .map_err(UploadError::Register)?;
        for (artifact, id) in artifacts.iter_mut().zip(ids) {
            artifact.id = Some(id);
        }

        let mut pool = WorkerPool::<BatchState>::new(self.max_concurrency);
        for (index, mut artifact) in artifacts.into_iter().enumerate() {
            let api = self.api.clone();
            let transport = Arc::clone(&transport);
            let span = tracing::Span::current();
            pool.spawn(move |handle| {
                async move {
                    tracing::info!("Uploading \"{}\" {} bytes", artifact.path, artifact.file_size);

                    match transport.upload(&artifact).await {
                        Ok(()) => artifact.state = ArtifactState::Finished,
                        Err(source) => {
                            tracing::error!(path = %artifact.path, error = %source, "upload failed");
                            artifact.state = ArtifactState::Error;
                            handle.lock().failures.push(ArtifactFailure::Upload {
                                path: artifact.path.clone(),
                                source,
                            });
                        }
                    }

                    if let Err(source) = api.update_artifact(&artifact).await {
                        tracing::error!(path = %artifact.path, error = %source, "state update failed");
                        handle.lock().failures.push(ArtifactFailure::StateUpdate {
                            path: artifact.path.clone(),
                            source,
                        });
                    }

                    handle.lock().artifacts.push((index, artifact));
                }
                .instrument(span)
            });
        }

        let mut state = pool.wait().await;
        if !state.failures.is_empty() {
            return Err(UploadError::Incomplete {
                failures: state.failures,
            });
        }
        state.artifacts.sort_by_key(|(index, _)| *index);
        Ok(state.artifacts.into_iter().map(|(_, artifact)| artifact).collect())
    }
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
