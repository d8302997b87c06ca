// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact upload destinations.
//!
//! The destination string configured for a job selects one of a fixed set
//! of transports. Parsing happens before any network activity so a bad
//! destination fails the upload phase up front.

use std::fmt;
use thiserror::Error;

const S3_SCHEME: &str = "s3://";

/// Errors from destination parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DestinationError {
    #[error("unknown upload destination: {0}")]
    Unrecognized(String),
    #[error("missing bucket name in upload destination: {0}")]
    MissingBucket(String),
}

/// Where a batch of artifacts is uploaded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The control server's own authenticated form upload
    Form,
    /// An S3 bucket, with an optional key prefix (no leading/trailing `/`)
    S3 { bucket: String, prefix: String },
}

impl Destination {
    /// Parse a configured destination. An empty string selects [`Destination::Form`].
    pub fn parse(raw: &str) -> Result<Self, DestinationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Destination::Form);
        }

        let Some(rest) = trimmed.strip_prefix(S3_SCHEME) else {
            return Err(DestinationError::Unrecognized(trimmed.to_string()));
        };

        let (bucket, prefix) = match rest.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (rest, ""),
        };
        if bucket.is_empty() {
            return Err(DestinationError::MissingBucket(trimmed.to_string()));
        }

        Ok(Destination::S3 {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    /// Object key for a relative artifact path under this destination.
    ///
    /// Only meaningful for object storage; form uploads use the path as-is.
    pub fn key_for(&self, path: &str) -> String {
        match self {
            Destination::S3 { prefix, .. } if !prefix.is_empty() => format!("{prefix}/{path}"),
            _ => path.to_string(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Form => write!(f, "form"),
            Destination::S3 { bucket, prefix } if prefix.is_empty() => {
                write!(f, "{S3_SCHEME}{bucket}")
            }
            Destination::S3 { bucket, prefix } => write!(f, "{S3_SCHEME}{bucket}/{prefix}"),
        }
    }
}

#[cfg(test)]
#[path = "destination_tests.rs"]
mod tests;
