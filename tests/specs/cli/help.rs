//! CLI help output specs

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("artifact");
}

#[test]
fn start_help_lists_env_fallbacks() {
    cli()
        .args(&["start", "--help"])
        .passes()
        .stdout_has("BK_ACCESS_TOKEN")
        .stdout_has("BK_BOOTSTRAP_SCRIPT")
        .stdout_has("BK_POLL_INTERVAL_MS");
}

#[test]
fn artifact_upload_help_shows_usage() {
    cli()
        .args(&["artifact", "upload", "--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("BK_JOB_ID");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
