// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Artifact, Job, JobId};
use std::path::Path;

/// A job as the server hands it out, with the given env vars.
pub fn fetched_job(id: &str, env: &[(&str, &str)]) -> Job {
    let mut job = Job::new(id);
    job.state = "scheduled".to_string();
    job.env = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    job
}

/// An artifact for `path` under `base`, with placeholder size and checksum.
pub fn artifact(job_id: &str, base: &Path, path: &str) -> Artifact {
    Artifact::new(
        JobId::new(job_id),
        path,
        base.join(path),
        path,
        0,
        "da39a3ee5e6b4b0d3255bfef95601890afd80709",
    )
}
