// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP control-plane client.

use super::{ApiError, ControlPlane};
use async_trait::async_trait;
use bk_core::{Artifact, ArtifactId, ArtifactState, Job, JobId};
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of the batch registration call.
#[derive(Serialize)]
struct CreateArtifactsRequest<'a> {
    artifacts: &'a [Artifact],
}

/// One entry of the batch registration response.
#[derive(Deserialize)]
struct CreatedArtifact {
    id: ArtifactId,
}

/// Body of a per-artifact state update.
#[derive(Serialize)]
struct UpdateArtifactRequest {
    state: ArtifactState,
}

/// JSON-over-HTTP client for the agent API.
#[derive(Clone)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl HttpControlPlane {
    /// Create a client for `endpoint` (e.g. `https://agent.buildkite.com/v2`).
    pub fn new(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bk-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, endpoint, access_token))
    }

    /// Reuse an existing [`reqwest::Client`] (shares its connection pool).
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.endpoint, path))
            .header(header::AUTHORIZATION, format!("Token {}", self.access_token))
    }

    /// Map a non-2xx response to [`ApiError::Status`], keeping the body for debugging.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn next_job(&self) -> Result<Option<Job>, ApiError> {
        let response = self.request(Method::GET, "jobs/next").send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let job: Job = Self::parse_response(response).await?;
        // An idle server may answer with an empty job object
        if job.id.is_empty() {
            return Ok(None);
        }
        Ok(Some(job))
    }

    async fn update_job(&self, job: &Job) -> Result<Job, ApiError> {
        let response = self
            .request(Method::PUT, &format!("jobs/{}", job.id))
            .json(job)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn create_artifacts(
        &self,
        job_id: &JobId,
        artifacts: &[Artifact],
    ) -> Result<Vec<ArtifactId>, ApiError> {
        let response = self
            .request(Method::POST, &format!("jobs/{}/artifacts", job_id))
            .json(&CreateArtifactsRequest { artifacts })
            .send()
            .await?;
        let created: Vec<CreatedArtifact> = Self::parse_response(response).await?;
        if created.len() != artifacts.len() {
            return Err(ApiError::BatchMismatch {
                expected: artifacts.len(),
                registered: created.len(),
            });
        }
        Ok(created.into_iter().map(|c| c.id).collect())
    }

    async fn update_artifact(&self, artifact: &Artifact) -> Result<(), ApiError> {
        let id = artifact
            .id
            .as_ref()
            .ok_or_else(|| ApiError::Unregistered(artifact.path.clone()))?;
        let response = self
            .request(
                Method::PUT,
                &format!("jobs/{}/artifacts/{}", artifact.job_id, id),
            )
            .json(&UpdateArtifactRequest {
                state: artifact.state,
            })
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
