// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact discovery.
//!
//! Collection is all or nothing: the first pattern or I/O error aborts it
//! and no partial manifest is returned.

use bk_core::{Artifact, JobId};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separator between patterns in a path list.
const PATTERN_SEPARATOR: char = ';';

/// Errors from artifact collection
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid path pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Expand every pattern in `paths` under `base_dir` into a manifest.
///
/// A file matched by several patterns yields one artifact per pattern.
/// A relative `base_dir` is resolved against the current directory first.
pub fn collect(job_id: &JobId, paths: &str, base_dir: &Path) -> Result<Vec<Artifact>, CollectError> {
    let base_dir = std::path::absolute(base_dir).map_err(|source| CollectError::Io {
        path: base_dir.to_path_buf(),
        source,
    })?;
    let base_dir = base_dir.as_path();
    let mut artifacts = Vec::new();

    for pattern in paths.split(PATTERN_SEPARATOR).map(str::trim) {
        if pattern.is_empty() {
            continue;
        }

        for absolute in expand_pattern(base_dir, pattern)? {
            let metadata = std::fs::metadata(&absolute).map_err(|source| CollectError::Io {
                path: absolute.clone(),
                source,
            })?;
            if metadata.is_dir() {
                tracing::debug!(path = %absolute.display(), "skipping directory");
                continue;
            }

            let (file_size, sha1sum) = checksum(&absolute)?;
            artifacts.push(Artifact::new(
                job_id.clone(),
                relative_path(base_dir, &absolute),
                absolute,
                pattern,
                file_size,
                sha1sum,
            ));
        }
    }

    Ok(artifacts)
}

/// Paths matching `pattern`, relative to `base_dir` unless absolute, sorted.
pub fn expand_pattern(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CollectError> {
    let full = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        let base = base_dir.to_string_lossy();
        let base = base.trim_end_matches('/');
        format!("{}/{}", glob::Pattern::escape(base), pattern)
    };

    let entries = glob::glob(&full).map_err(|source| CollectError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(CollectError::Io {
                    path,
                    source: e.into_error(),
                });
            }
        }
    }
    matches.sort();
    Ok(matches)
}

/// `path` relative to `base_dir`, `/`-separated, without a leading separator.
pub fn relative_path(base_dir: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(base_dir) {
        Ok(rest) => rest.to_string_lossy().into_owned(),
        Err(_) => {
            let full = path.to_string_lossy();
            let base = base_dir.to_string_lossy();
            full.strip_prefix(base.trim_end_matches('/'))
                .unwrap_or(&full)
                .to_string()
        }
    };
    let relative = relative.strip_prefix('/').unwrap_or(&relative);
    relative.replace(std::path::MAIN_SEPARATOR, "/")
}

/// Size and hex SHA-1 of a file, from a single read through one handle.
fn checksum(path: &Path) -> Result<(u64, String), CollectError> {
    let io_err = |source| CollectError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha1::new();
    let size = io::copy(&mut file, &mut hasher).map_err(io_err)?;
    Ok((size, format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
#[path = "collect_tests.rs"]
mod tests;
