// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bk-core: data model shared by the build agent crates

pub mod artifact;
pub mod clock;
pub mod destination;
pub mod id;
pub mod job;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use artifact::{Artifact, ArtifactId, ArtifactState};
pub use clock::{Clock, FakeClock, SystemClock};
pub use destination::{Destination, DestinationError};
pub use job::{
    Job, JobId, JobPhase, PhaseError, ARTIFACT_DESTINATION_ENV, ARTIFACT_PATHS_ENV,
    STATE_CANCELED,
};
