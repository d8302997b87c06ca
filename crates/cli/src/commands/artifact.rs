// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bk-agent artifact`: artifact commands usable from inside a job

use anyhow::{Context, Result};
use bk_adapters::{ControlPlane, DefaultTransportProvider, TracedControlPlane, TransportProvider};
use bk_core::JobId;
use bk_engine::{ArtifactUploader, DEFAULT_MAX_CONCURRENCY};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use super::ConnectionArgs;
use crate::env;

#[derive(Args, Debug)]
pub struct ArtifactArgs {
    #[command(subcommand)]
    pub command: ArtifactCommand,
}

#[derive(Subcommand, Debug)]
pub enum ArtifactCommand {
    /// Upload files matching glob patterns
    Upload {
        /// Glob patterns separated by ';' (e.g. "log/*.log;pkg/*.tar.gz")
        paths: String,

        /// Where to upload: s3://bucket/prefix, or omit for the agent API
        #[arg(default_value = "")]
        destination: String,

        /// Job the artifacts belong to
        #[arg(long, env = "BK_JOB_ID")]
        job: String,

        /// Directory the patterns are relative to [default: working directory]
        #[arg(long, env = "BK_BUILD_DIR")]
        build_dir: Option<PathBuf>,

        /// Maximum uploads in flight
        #[arg(long, env = "BK_UPLOAD_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
        concurrency: usize,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

pub async fn handle(command: ArtifactCommand) -> Result<()> {
    match command {
        ArtifactCommand::Upload {
            paths,
            destination,
            job,
            build_dir,
            concurrency,
            connection,
        } => {
            let api = connection.control_plane()?;
            let transports = DefaultTransportProvider::for_control_plane(&api);
            let uploader = ArtifactUploader::new(TracedControlPlane::new(api), transports)
                .with_max_concurrency(concurrency);
            let build_dir = env::resolve_build_dir(build_dir).context("no build directory")?;
            upload(&uploader, &JobId::new(job), &paths, &destination, &build_dir).await
        }
    }
}

async fn upload<C, T>(
    uploader: &ArtifactUploader<C, T>,
    job_id: &JobId,
    paths: &str,
    destination: &str,
    build_dir: &Path,
) -> Result<()>
where
    C: ControlPlane,
    T: TransportProvider,
{
    let artifacts = uploader
        .upload(job_id, paths, destination, build_dir)
        .await?;
    if !artifacts.is_empty() {
        println!("Uploaded {} artifacts", artifacts.len());
    }
    Ok(())
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
