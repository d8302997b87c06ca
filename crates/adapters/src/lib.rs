// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O

pub mod api;
pub mod process;
pub mod traced;
pub mod transport;

#[cfg(test)]
mod test_http;

pub use api::{ApiError, ControlPlane, HttpControlPlane};
pub use process::{
    LocalProcess, LocalProcessAdapter, ProcessAdapter, ProcessError, RunningProcess,
    SIGNALED_EXIT_STATUS,
};
pub use traced::TracedControlPlane;
pub use transport::{
    DefaultTransportProvider, FormTransport, S3Transport, Transport, TransportError,
    TransportProvider,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use api::{ApiCall, FakeControlPlane};
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcess, FakeProcessAdapter, FakeScript, ProcessCall};
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeTransport, FakeTransportProvider, TransportCall};
