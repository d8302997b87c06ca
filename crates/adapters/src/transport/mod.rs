// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact upload transports

mod form;
mod s3;

pub use form::FormTransport;
pub use s3::S3Transport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, FakeTransportProvider, TransportCall};

use crate::api::HttpControlPlane;
use async_trait::async_trait;
use bk_core::{Artifact, Destination};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from transports
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("object storage error: {0}")]
    ObjectStore(String),
    #[error("transport does not support destination {0}")]
    Unsupported(String),
    #[error("transport used before setup")]
    NotConfigured,
}

/// An upload backend.
///
/// `setup` runs exactly once per batch, before `url` or `upload`. After
/// setup the transport is shared read-only by every upload task.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn setup(&mut self, destination: &Destination) -> Result<(), TransportError>;

    /// Location the artifact will be reachable at once uploaded.
    fn url(&self, artifact: &Artifact) -> String;

    async fn upload(&self, artifact: &Artifact) -> Result<(), TransportError>;
}

/// Picks the concrete transport for a destination.
pub trait TransportProvider: Clone + Send + Sync + 'static {
    fn transport(&self, destination: &Destination) -> Result<Box<dyn Transport>, TransportError>;
}

/// Maps `Form` to [`FormTransport`] and `S3` to [`S3Transport`].
#[derive(Clone)]
pub struct DefaultTransportProvider {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl DefaultTransportProvider {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        }
    }

    /// Form uploads go to the same server, with the same credentials.
    pub fn for_control_plane(api: &HttpControlPlane) -> Self {
        Self::new(api.client().clone(), api.endpoint(), api.access_token())
    }
}

impl TransportProvider for DefaultTransportProvider {
    fn transport(&self, destination: &Destination) -> Result<Box<dyn Transport>, TransportError> {
        Ok(match destination {
            Destination::Form => Box::new(FormTransport::new(
                self.client.clone(),
                self.endpoint.clone(),
                self.access_token.clone(),
            )),
            Destination::S3 { .. } => Box::new(S3Transport::new()),
        })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
