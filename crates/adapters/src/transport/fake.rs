// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Transport, TransportError, TransportProvider};
use async_trait::async_trait;
use bk_core::{Artifact, Destination};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Setup { destination: Destination },
    Upload { path: String },
}

#[derive(Default)]
struct FakeTransportState {
    calls: Vec<TransportCall>,
    fail_paths: HashSet<String>,
    fail_setup: Option<String>,
    upload_delay: Duration,
    path_delays: HashMap<String, Duration>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Fake transport that records uploads and tracks their overlap.
///
/// Clones share state, so a test keeps one handle while the provider hands
/// boxed clones to the code under test.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeTransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the upload of the artifact at `path`.
    pub fn fail_upload(&self, path: &str) {
        self.inner.lock().fail_paths.insert(path.to_string());
    }

    /// Fail `setup` with an object storage error.
    pub fn fail_setup(&self, message: &str) {
        self.inner.lock().fail_setup = Some(message.to_string());
    }

    /// Hold each upload open for `delay` (on the tokio clock).
    pub fn set_upload_delay(&self, delay: Duration) {
        self.inner.lock().upload_delay = delay;
    }

    /// Hold the upload of the artifact at `path` open for `delay` instead.
    pub fn delay_upload(&self, path: &str, delay: Duration) {
        self.inner.lock().path_delays.insert(path.to_string(), delay);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.clone()
    }

    /// Paths uploaded (or attempted), in call order.
    pub fn uploaded(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Upload { path } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Highest number of uploads observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().max_in_flight
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn setup(&mut self, destination: &Destination) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TransportCall::Setup {
            destination: destination.clone(),
        });
        match &inner.fail_setup {
            Some(message) => Err(TransportError::ObjectStore(message.clone())),
            None => Ok(()),
        }
    }

    fn url(&self, artifact: &Artifact) -> String {
        format!("fake://{}", artifact.path)
    }

    async fn upload(&self, artifact: &Artifact) -> Result<(), TransportError> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls.push(TransportCall::Upload {
                path: artifact.path.clone(),
            });
            inner.in_flight += 1;
            inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);
            inner
                .path_delays
                .get(&artifact.path)
                .copied()
                .unwrap_or(inner.upload_delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        inner.in_flight -= 1;
        if inner.fail_paths.contains(&artifact.path) {
            return Err(TransportError::Status {
                status: 500,
                body: format!("cannot store {}", artifact.path),
            });
        }
        Ok(())
    }
}

/// Provider that always hands out a clone of one [`FakeTransport`].
#[derive(Clone, Default)]
pub struct FakeTransportProvider {
    transport: FakeTransport,
    requested: Arc<Mutex<Vec<Destination>>>,
}

impl FakeTransportProvider {
    pub fn new(transport: FakeTransport) -> Self {
        Self {
            transport,
            requested: Arc::default(),
        }
    }

    pub fn transport_handle(&self) -> &FakeTransport {
        &self.transport
    }

    /// Destinations a transport was requested for.
    pub fn requested(&self) -> Vec<Destination> {
        self.requested.lock().clone()
    }
}

impl TransportProvider for FakeTransportProvider {
    fn transport(&self, destination: &Destination) -> Result<Box<dyn Transport>, TransportError> {
        self.requested.lock().push(destination.clone());
        Ok(Box::new(self.transport.clone()))
    }
}
