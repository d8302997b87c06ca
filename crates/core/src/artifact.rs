// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact records produced after a job runs.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Identifier the control server assigns when a batch is registered.
    pub struct ArtifactId;
}

/// Upload state of one artifact, as reported to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    #[default]
    New,
    Finished,
    Error,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactState::New => write!(f, "new"),
            ArtifactState::Finished => write!(f, "finished"),
            ArtifactState::Error => write!(f, "error"),
        }
    }
}

/// One discovered file mapped to one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ArtifactId>,
    pub job_id: JobId,
    /// Path relative to the collection base directory, `/`-separated
    pub path: String,
    pub absolute_path: PathBuf,
    /// Pattern that matched this file
    pub glob_path: String,
    pub file_size: u64,
    pub sha1sum: String,
    #[serde(default)]
    pub state: ArtifactState,
    /// Transport-assigned location, set before registration
    #[serde(default)]
    pub url: String,
}

impl Artifact {
    pub fn new(
        job_id: JobId,
        path: impl Into<String>,
        absolute_path: impl Into<PathBuf>,
        glob_path: impl Into<String>,
        file_size: u64,
        sha1sum: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            job_id,
            path: path.into(),
            absolute_path: absolute_path.into(),
            glob_path: glob_path.into(),
            file_size,
            sha1sum: sha1sum.into(),
            state: ArtifactState::New,
            url: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
