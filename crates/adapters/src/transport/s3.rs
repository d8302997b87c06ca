// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3 object storage transport

use super::{Transport, TransportError};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bk_core::{Artifact, Destination};

/// Bucket and prefix resolved at setup.
#[derive(Debug, Clone)]
struct Target {
    bucket: String,
    destination: Destination,
}

/// Uploads artifacts as objects under `s3://bucket/prefix/`.
///
/// Credentials come from the default AWS provider chain.
#[derive(Default)]
pub struct S3Transport {
    client: Option<aws_sdk_s3::Client>,
    target: Option<Target>,
}

impl S3Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client instead of loading the default AWS config.
    pub fn with_client(client: aws_sdk_s3::Client) -> Self {
        Self {
            client: Some(client),
            target: None,
        }
    }

    fn key(&self, artifact: &Artifact) -> Option<(&str, String)> {
        self.target.as_ref().map(|target| {
            (
                target.bucket.as_str(),
                target.destination.key_for(&artifact.path),
            )
        })
    }
}

#[async_trait]
impl Transport for S3Transport {
    async fn setup(&mut self, destination: &Destination) -> Result<(), TransportError> {
        let Destination::S3 { bucket, .. } = destination else {
            return Err(TransportError::Unsupported(destination.to_string()));
        };
        if self.client.is_none() {
            let config = aws_config::load_from_env().await;
            self.client = Some(aws_sdk_s3::Client::new(&config));
        }
        self.target = Some(Target {
            bucket: bucket.clone(),
            destination: destination.clone(),
        });
        tracing::debug!(%destination, "s3 transport ready");
        Ok(())
    }

    fn url(&self, artifact: &Artifact) -> String {
        match self.key(artifact) {
            Some((bucket, key)) => format!("s3://{bucket}/{key}"),
            None => artifact.path.clone(),
        }
    }

    async fn upload(&self, artifact: &Artifact) -> Result<(), TransportError> {
        let (Some(client), Some((bucket, key))) = (self.client.as_ref(), self.key(artifact)) else {
            return Err(TransportError::NotConfigured);
        };

        let body = ByteStream::from_path(&artifact.absolute_path)
            .await
            .map_err(|e| {
                TransportError::ObjectStore(format!(
                    "cannot read {}: {e}",
                    artifact.absolute_path.display()
                ))
            })?;

        client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(artifact.file_size as i64)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::ObjectStore(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "s3_tests.rs"]
mod tests;
