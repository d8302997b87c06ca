// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated multipart upload to the control server

use super::{Transport, TransportError};
use async_trait::async_trait;
use bk_core::{Artifact, Destination};
use reqwest::header;
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;

/// Posts each file as a multipart form to the control server.
pub struct FormTransport {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl FormTransport {
    pub fn new(
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

    fn upload_url(&self, artifact: &Artifact) -> String {
        format!("{}/jobs/{}/artifacts/upload", self.endpoint, artifact.job_id)
    }
}

#[async_trait]
impl Transport for FormTransport {
    async fn setup(&mut self, destination: &Destination) -> Result<(), TransportError> {
        match destination {
            Destination::Form => Ok(()),
            other => Err(TransportError::Unsupported(other.to_string())),
        }
    }

    fn url(&self, artifact: &Artifact) -> String {
        format!(
            "{}/jobs/{}/artifacts/{}",
            self.endpoint, artifact.job_id, artifact.path
        )
    }

    async fn upload(&self, artifact: &Artifact) -> Result<(), TransportError> {
        let file = tokio::fs::File::open(&artifact.absolute_path)
            .await
            .map_err(|source| TransportError::Io {
                path: artifact.absolute_path.clone(),
                source,
            })?;
        let file_name = artifact
            .absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| artifact.path.clone());

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, artifact.file_size).file_name(file_name);
        let form = Form::new()
            .text("path", artifact.path.clone())
            .text("sha1sum", artifact.sha1sum.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.upload_url(artifact))
            .header(header::AUTHORIZATION, format!("Token {}", self.access_token))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
