// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact pipeline: discovery, registration and upload

mod collect;
mod upload;

pub use collect::{collect, expand_pattern, relative_path, CollectError};
pub use upload::{ArtifactFailure, ArtifactUploader, UploadError};
