// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Build agent execution engine

mod agent;
pub mod artifact;
pub mod job;
pub mod pool;
pub mod process;

pub use agent::{Agent, Poll};
pub use artifact::{ArtifactFailure, ArtifactUploader, CollectError, UploadError};
pub use job::{JobError, JobRunner, DEFAULT_TICK_INTERVAL};
pub use pool::{PoolHandle, WorkerPool, DEFAULT_MAX_CONCURRENCY};
pub use process::{run_script, ProcessOutcome, RunError, Tick};
