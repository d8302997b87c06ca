// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane API adapters

mod http;

pub use http::HttpControlPlane;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ApiCall, FakeControlPlane};

use async_trait::async_trait;
use bk_core::{Artifact, ArtifactId, Job, JobId};
use thiserror::Error;

/// Errors from control-plane calls
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("artifact {0} has not been registered with the server")]
    Unregistered(String),
    #[error("server registered {registered} artifacts, expected {expected}")]
    BatchMismatch { expected: usize, registered: usize },
}

/// The agent's view of the control server.
///
/// Every call is a single round trip; nothing here retries.
#[async_trait]
pub trait ControlPlane: Clone + Send + Sync + 'static {
    /// Fetch the next job assigned to this agent, or `None` when idle.
    async fn next_job(&self) -> Result<Option<Job>, ApiError>;

    /// Push the local job state; returns the server's authoritative copy.
    async fn update_job(&self, job: &Job) -> Result<Job, ApiError>;

    /// Register a whole manifest in one call, before any upload begins.
    ///
    /// Returns the server-assigned ids in manifest order.
    async fn create_artifacts(
        &self,
        job_id: &JobId,
        artifacts: &[Artifact],
    ) -> Result<Vec<ArtifactId>, ApiError>;

    /// Report a single artifact's new state.
    async fn update_artifact(&self, artifact: &Artifact) -> Result<(), ApiError>;
}
