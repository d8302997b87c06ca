//! `bk-agent start` specs: a job from the fake API runs end to end.

use crate::prelude::*;

fn finished_update(api: &FakeApi) -> Option<serde_json::Value> {
    api.job_updates()
        .into_iter()
        .find(|j| j.get("finished_at").is_some())
}

#[test]
fn runs_job_and_reports_exit_status() {
    let project = Project::empty();
    let script = project.script(
        "bootstrap.sh",
        "#!/bin/sh\necho \"hello from $BK_JOB_GREETING\"\nexit 3\n",
    );
    let api = FakeApi::start();
    api.push_job(r#"{"id":"job-1","state":"scheduled","env":{"BK_JOB_GREETING":"the job"}}"#);

    let mut agent = project
        .bk()
        .args(&["start"])
        .env("BK_ACCESS_TOKEN", "secret")
        .env("BK_ENDPOINT", api.url())
        .env("BK_BOOTSTRAP_SCRIPT", &script)
        .spawn();

    let done = wait_for(SPEC_WAIT_MAX_MS, || finished_update(&api).is_some());
    agent.kill().unwrap();
    let _ = agent.wait();
    assert!(done, "job never finished: {:?}", api.requests());

    let finished = finished_update(&api).unwrap();
    assert_eq!(finished["exit_status"], "3");
    assert!(finished["output"]
        .as_str()
        .unwrap()
        .contains("hello from the job"));

    let first = &api.job_updates()[0];
    assert!(first.get("started_at").is_some());
    assert!(first.get("exit_status").is_none());
}

#[test]
fn uploads_artifacts_after_job() {
    let project = Project::empty();
    let script = project.script(
        "bootstrap.sh",
        "#!/bin/sh\necho report > report.xml\n",
    );
    let api = FakeApi::start();
    api.push_job(
        r#"{"id":"job-1","state":"scheduled","env":{"BUILDKITE_ARTIFACT_PATHS":"*.xml"}}"#,
    );

    let mut agent = project
        .bk()
        .args(&["start"])
        .env("BK_ACCESS_TOKEN", "secret")
        .env("BK_ENDPOINT", api.url())
        .env("BK_BOOTSTRAP_SCRIPT", &script)
        .spawn();

    let uploaded = wait_for(SPEC_WAIT_MAX_MS, || {
        api.requests()
            .iter()
            .any(|r| r.method == "PUT" && r.path.contains("/artifacts/"))
    });
    agent.kill().unwrap();
    let _ = agent.wait();
    assert!(uploaded, "no artifact state update: {:?}", api.requests());

    let requests = api.requests();
    assert!(requests
        .iter()
        .any(|r| r.path == "/v2/jobs/job-1/artifacts/upload" && r.body.contains("report.xml")));
}

#[test]
fn idle_agent_keeps_polling() {
    let api = FakeApi::start();

    let mut agent = cli()
        .args(&["start", "--bootstrap-script", "/bin/true"])
        .env("BK_ACCESS_TOKEN", "secret")
        .env("BK_ENDPOINT", api.url())
        .spawn();

    let polled = wait_for(SPEC_WAIT_MAX_MS, || {
        api.requests()
            .iter()
            .filter(|r| r.path == "/v2/jobs/next")
            .count()
            >= 3
    });
    agent.kill().unwrap();
    let _ = agent.wait();
    assert!(polled);
}
