// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod artifact;
pub mod start;

use anyhow::Result;
use bk_adapters::HttpControlPlane;
use clap::Args;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://agent.buildkite.com/v2";

/// How to reach the agent API.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Agent API endpoint
    #[arg(long, env = "BK_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Agent access token
    #[arg(long, env = "BK_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Timeout for a single API request, in milliseconds
    #[arg(
        long = "http-timeout-ms",
        env = "BK_HTTP_TIMEOUT_MS",
        default_value = "60000",
        value_parser = crate::env::parse_millis
    )]
    pub http_timeout: Duration,
}

impl ConnectionArgs {
    pub fn control_plane(&self) -> Result<HttpControlPlane> {
        Ok(HttpControlPlane::new(
            &self.endpoint,
            &self.access_token,
            self.http_timeout,
        )?)
    }
}
