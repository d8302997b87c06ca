// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a job, assigned by the control server.
    #[derive(Default)]
    pub struct JobId;
}

/// Server state that asks the agent to stop the running process.
pub const STATE_CANCELED: &str = "canceled";

/// Job env var listing `;`-separated artifact path patterns.
pub const ARTIFACT_PATHS_ENV: &str = "BUILDKITE_ARTIFACT_PATHS";

/// Job env var naming the artifact upload destination.
pub const ARTIFACT_DESTINATION_ENV: &str = "BUILDKITE_ARTIFACT_UPLOAD_DESTINATION";

/// Local lifecycle phase of a job run.
///
/// Phases only move forward. The server never sees this value; it infers
/// progress from which optional timestamps are present on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    /// Received from the server, nothing done yet
    #[default]
    Fetched,
    /// `started_at` stamped, process not yet launched
    Started,
    /// Process is alive and being supervised
    Running,
    /// Process has exited (or never launched); results recorded
    Finalizing,
    /// `finished_at` stamped; terminal
    Done,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobPhase::Fetched => write!(f, "fetched"),
            JobPhase::Started => write!(f, "started"),
            JobPhase::Running => write!(f, "running"),
            JobPhase::Finalizing => write!(f, "finalizing"),
            JobPhase::Done => write!(f, "done"),
        }
    }
}

/// Attempted a phase change the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {job_id} cannot move from {from} to {to}")]
pub struct PhaseError {
    pub job_id: JobId,
    pub from: JobPhase,
    pub to: JobPhase,
}

/// A unit of work fetched from the control server.
///
/// Optional fields are `None` until their phase is reached so that the
/// serialized form omits them instead of sending a zero value the server
/// would read as "finished".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    /// Exit status as a string: `"0"` must be distinguishable from "not finished".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip)]
    phase: JobPhase,
}

impl Job {
    pub fn new(id: impl Into<JobId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// True when the server has asked for this job to be cancelled.
    pub fn is_canceled(&self) -> bool {
        self.state == STATE_CANCELED
    }

    /// Environment as `(key, value)` pairs for process injection.
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Artifact patterns configured for this job, if any non-blank value is set.
    pub fn artifact_paths(&self) -> Option<&str> {
        self.env
            .get(ARTIFACT_PATHS_ENV)
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
    }

    /// Artifact destination for this job (empty means the default transport).
    pub fn artifact_destination(&self) -> &str {
        self.env
            .get(ARTIFACT_DESTINATION_ENV)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// `Fetched -> Started`: stamp `started_at`.
    pub fn mark_started(&mut self, at: impl Into<String>) -> Result<(), PhaseError> {
        self.transition(JobPhase::Started)?;
        self.started_at = Some(at.into());
        Ok(())
    }

    /// `Started -> Running`: the process has launched.
    pub fn mark_running(&mut self) -> Result<(), PhaseError> {
        self.transition(JobPhase::Running)
    }

    /// Copy a live output snapshot while running.
    pub fn record_output(&mut self, output: &str) {
        if self.output != output {
            self.output = output.to_string();
        }
    }

    /// `Running -> Finalizing` after a natural or kill-induced exit.
    pub fn record_exit(&mut self, output: String, exit_status: i32) -> Result<(), PhaseError> {
        self.transition(JobPhase::Finalizing)?;
        self.output = output;
        self.exit_status = Some(exit_status.to_string());
        Ok(())
    }

    /// `Started -> Finalizing` when the process could not be launched.
    ///
    /// The error description replaces the output and no exit status is recorded.
    pub fn record_launch_failure(&mut self, error: &str) -> Result<(), PhaseError> {
        self.transition(JobPhase::Finalizing)?;
        self.output = error.to_string();
        self.exit_status = None;
        Ok(())
    }

    /// `Finalizing -> Done`: stamp `finished_at`.
    pub fn mark_finished(&mut self, at: impl Into<String>) -> Result<(), PhaseError> {
        self.transition(JobPhase::Done)?;
        self.finished_at = Some(at.into());
        Ok(())
    }

    fn transition(&mut self, to: JobPhase) -> Result<(), PhaseError> {
        let allowed = matches!(
            (self.phase, to),
            (JobPhase::Fetched, JobPhase::Started)
                | (JobPhase::Started, JobPhase::Running)
                | (JobPhase::Started, JobPhase::Finalizing)
                | (JobPhase::Running, JobPhase::Finalizing)
                | (JobPhase::Finalizing, JobPhase::Done)
        );
        if !allowed {
            return Err(PhaseError {
                job_id: self.id.clone(),
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {} ({})", self.id, self.state)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
