//! `bk-agent artifact upload` specs

use crate::prelude::*;

fn upload(project: &Project, api: &FakeApi, args: &[&str]) -> CliBuilder {
    let mut full = vec!["artifact", "upload"];
    full.extend_from_slice(args);
    project
        .bk()
        .args(&full)
        .env("BK_JOB_ID", "job-1")
        .env("BK_ACCESS_TOKEN", "secret")
        .env("BK_ENDPOINT", api.url())
}

#[test]
fn no_matching_files_succeeds_without_requests() {
    let project = Project::empty();
    project.file("notes.txt", "hi");
    let api = FakeApi::start();

    upload(&project, &api, &["*.log"])
        .passes()
        .stderr_has("No files matched paths: *.log");

    assert!(api.requests().is_empty());
}

#[test]
fn unknown_destination_fails_before_any_request() {
    let project = Project::empty();
    project.file("a.log", "a");
    let api = FakeApi::start();

    upload(&project, &api, &["*.log", "ftp://example.com/drop"])
        .fails()
        .stderr_has("unknown upload destination: ftp://example.com/drop");

    assert!(api.requests().is_empty());
}

#[test]
fn uploads_through_the_agent_api() {
    let project = Project::empty();
    project.file("a.log", "alpha");
    project.file("b.log", "bravo");
    project.file("sub/c.log", "charlie");
    let api = FakeApi::start();

    upload(&project, &api, &["*.log"])
        .passes()
        .stdout_has("Uploaded 2 artifacts")
        .stderr_has("Found 2 files that match \"*.log\"");

    let requests = api.requests();
    let register: Vec<_> = requests
        .iter()
        .filter(|r| r.method == "POST" && r.path == "/v2/jobs/job-1/artifacts")
        .collect();
    assert_eq!(register.len(), 1);
    assert!(register[0].body.contains("a.log"));
    assert!(!register[0].body.contains("c.log"));

    let uploads = requests
        .iter()
        .filter(|r| r.path == "/v2/jobs/job-1/artifacts/upload")
        .count();
    assert_eq!(uploads, 2);

    let finished = requests
        .iter()
        .filter(|r| r.method == "PUT" && r.body.contains("finished"))
        .count();
    assert_eq!(finished, 2);
}

#[test]
fn recursive_pattern_reaches_subdirectories() {
    let project = Project::empty();
    project.file("a.log", "alpha");
    project.file("sub/deeper/c.log", "charlie");
    let api = FakeApi::start();

    upload(&project, &api, &["**/*.log"])
        .passes()
        .stdout_has("Uploaded 2 artifacts");

    let register = api
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.path == "/v2/jobs/job-1/artifacts")
        .unwrap();
    assert!(register.body.contains("sub/deeper/c.log"));
}
