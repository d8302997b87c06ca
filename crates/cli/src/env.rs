// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment access for the agent binary.

use std::path::PathBuf;
use std::time::Duration;

/// Parse a millisecond count (value parser for the `*_MS` options).
pub fn parse_millis(value: &str) -> Result<Duration, String> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| format!("expected a number of milliseconds, got '{value}'"))
}

/// Load `.env` from the working directory. Variables already set win.
///
/// A missing file is not an error; anything else is handed back so it can
/// be logged once logging is up.
pub fn load_dotenv() -> Option<dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(e),
    }
}

/// Directory artifact paths are resolved against: the explicit option, or
/// the current working directory.
pub fn resolve_build_dir(explicit: Option<PathBuf>) -> std::io::Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => std::env::current_dir(),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
