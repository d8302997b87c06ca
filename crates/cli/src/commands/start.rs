// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bk-agent start`: poll for jobs and run them until told to stop

use anyhow::{Context, Result};
use bk_adapters::{
    ControlPlane, DefaultTransportProvider, LocalProcessAdapter, ProcessAdapter,
    TracedControlPlane, TransportProvider,
};
use bk_core::{Clock, SystemClock};
use bk_engine::{Agent, ArtifactUploader, JobRunner, Poll, DEFAULT_MAX_CONCURRENCY};
use clap::Args;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use super::ConnectionArgs;
use crate::env;

#[derive(Args, Debug)]
pub struct StartArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Script run for every job
    #[arg(long, env = "BK_BOOTSTRAP_SCRIPT")]
    pub bootstrap_script: PathBuf,

    /// Directory artifacts are collected from [default: working directory]
    #[arg(long, env = "BK_BUILD_DIR")]
    pub build_dir: Option<PathBuf>,

    /// Wait between polls when no job is available, in milliseconds
    #[arg(
        long = "poll-interval-ms",
        env = "BK_POLL_INTERVAL_MS",
        default_value = "5000",
        value_parser = env::parse_millis
    )]
    pub poll_interval: Duration,

    /// How often a running job's output is pushed, in milliseconds
    #[arg(
        long = "tick-interval-ms",
        env = "BK_TICK_INTERVAL_MS",
        default_value = "1000",
        value_parser = env::parse_millis
    )]
    pub tick_interval: Duration,

    /// Maximum artifact uploads in flight
    #[arg(long, env = "BK_UPLOAD_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub upload_concurrency: usize,
}

pub async fn handle(args: StartArgs) -> Result<()> {
    let api = args.connection.control_plane()?;
    let transports = DefaultTransportProvider::for_control_plane(&api);
    let api = TracedControlPlane::new(api);
    let build_dir = env::resolve_build_dir(args.build_dir).context("no build directory")?;

    let jobs = JobRunner::new(
        api.clone(),
        LocalProcessAdapter::new(),
        SystemClock,
        &args.bootstrap_script,
    )
    .with_tick_interval(args.tick_interval);
    let uploader =
        ArtifactUploader::new(api, transports).with_max_concurrency(args.upload_concurrency);
    let agent = Agent::new(jobs, uploader, &build_dir);

    tracing::info!(
        endpoint = %args.connection.endpoint,
        build_dir = %build_dir.display(),
        "Agent started, waiting for jobs"
    );
    run_loop(&agent, args.poll_interval, shutdown_signal()).await
}

/// Poll until `shutdown` resolves. Shutdown is only observed between jobs.
pub(crate) async fn run_loop<C, P, K, T>(
    agent: &Agent<C, P, K, T>,
    poll_interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    C: ControlPlane,
    P: ProcessAdapter,
    K: Clock,
    T: TransportProvider,
{
    tokio::pin!(shutdown);
    loop {
        let poll = agent
            .poll_once()
            .await
            .context("lost contact with the agent API")?;

        let delay = match poll {
            Poll::Ran(job) => {
                tracing::info!(job_id = %job.id, exit_status = ?job.exit_status, "Job complete");
                Duration::ZERO
            }
            Poll::Idle => poll_interval,
        };

        tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!("Shutting down");
                return Ok(());
            }
            () = tokio::time::sleep(delay) => {}
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
