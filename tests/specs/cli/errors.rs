//! CLI error handling specs

use crate::prelude::*;

#[test]
fn start_without_token_fails() {
    cli()
        .args(&["start", "--bootstrap-script", "/bin/true"])
        .fails()
        .stderr_has("--access-token");
}

#[test]
fn unknown_command_fails() {
    cli().args(&["deploy"]).fails().stderr_has("unrecognized subcommand");
}

#[test]
fn bad_interval_is_rejected() {
    cli()
        .args(&[
            "start",
            "--access-token",
            "secret",
            "--bootstrap-script",
            "/bin/true",
            "--poll-interval-ms",
            "5s",
        ])
        .fails()
        .stderr_has("milliseconds");
}

#[test]
fn unreachable_api_fails_upload() {
    let project = Project::empty();
    project.file("a.log", "a");

    project
        .bk()
        .args(&["artifact", "upload", "*.log", "--job", "j1"])
        .env("BK_ACCESS_TOKEN", "secret")
        .env("BK_ENDPOINT", "http://127.0.0.1:1/v2")
        .fails()
        .stderr_has("Error:");
}
