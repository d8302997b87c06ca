//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for running the bk-agent binary and a stand-in
//! agent API server it can talk to.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::Arc;

// Fast intervals so end-to-end specs finish quickly.
const BK_POLL_INTERVAL_MS: &str = "50";
const BK_TICK_INTERVAL_MS: &str = "100";
const BK_HTTP_TIMEOUT_MS: &str = "2000";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Create a CLI builder for bk-agent commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: vec![
                ("BK_POLL_INTERVAL_MS".into(), BK_POLL_INTERVAL_MS.into()),
                ("BK_TICK_INTERVAL_MS".into(), BK_TICK_INTERVAL_MS.into()),
                ("BK_HTTP_TIMEOUT_MS".into(), BK_HTTP_TIMEOUT_MS.into()),
                ("RUST_LOG".into(), "info".into()),
            ],
        }
    }

    /// Add CLI arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set working directory
    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    /// Set environment variable
    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(binary_path("bk-agent"));
        cmd.args(&self.args);

        // Keep the caller's agent configuration out of the specs
        for (key, _) in std::env::vars() {
            if key.starts_with("BK_") {
                cmd.env_remove(key);
            }
        }

        // A stray .env in the repo would otherwise be picked up
        let dir = self.dir.unwrap_or_else(std::env::temp_dir);
        cmd.current_dir(dir);

        for (key, value) in self.envs {
            cmd.env(key, value);
        }

        cmd
    }

    /// Start in the background, discarding output
    pub fn spawn(self) -> Child {
        self.command()
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("command should start")
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout unexpectedly contains '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Project
// =============================================================================

/// Temporary build directory with helper methods.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file, creating parent directories
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }

    /// Write an executable script
    pub fn script(&self, path: impl AsRef<Path>, content: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let full = self.dir.path().join(path);
        self.file(&full, content);
        std::fs::set_permissions(&full, std::fs::Permissions::from_mode(0o755)).unwrap();
        full
    }

    /// bk-agent running with this project as its working and build directory
    pub fn bk(&self) -> CliBuilder {
        cli()
            .pwd(self.path())
            .env("BK_BUILD_DIR", self.path())
    }
}

// =============================================================================
// Fake agent API
// =============================================================================

/// A request the fake API received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: String,
}

#[derive(Default)]
struct ApiState {
    jobs: VecDeque<String>,
    requests: Vec<Recorded>,
    next_artifact: usize,
}

type SharedState = Arc<Mutex<ApiState>>;

/// Stand-in agent API served by axum on a background runtime.
///
/// Hands out queued jobs, echoes job updates back unchanged, registers
/// artifacts with sequential ids and accepts uploads.
#[derive(Clone)]
pub struct FakeApi {
    url: String,
    state: SharedState,
}

impl FakeApi {
    pub fn start() -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("http://{}/v2", listener.local_addr().unwrap());
        let state = SharedState::default();

        let app = Router::new()
            .route("/v2/jobs/next", get(next_job))
            .route("/v2/jobs/{job_id}", put(update_job))
            .route("/v2/jobs/{job_id}/artifacts", post(create_artifacts))
            .route("/v2/jobs/{job_id}/artifacts/upload", post(upload_artifact))
            .route("/v2/jobs/{job_id}/artifacts/{artifact_id}", put(update_artifact))
            .fallback(unknown)
            .with_state(Arc::clone(&state));

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self { url, state }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queue a job JSON object for `GET jobs/next`
    pub fn push_job(&self, json: &str) {
        self.state.lock().jobs.push_back(json.to_string());
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().requests.clone()
    }

    /// Bodies of every `PUT jobs/{id}`, parsed
    pub fn job_updates(&self) -> Vec<serde_json::Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "PUT" && r.path.starts_with("/v2/jobs/") && !r.path.contains("/artifacts"))
            .filter_map(|r| serde_json::from_str(&r.body).ok())
            .collect()
    }
}

fn record(state: &mut ApiState, method: &Method, uri: &Uri, body: &Bytes) -> String {
    let body = String::from_utf8_lossy(body).into_owned();
    state.requests.push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        body: body.clone(),
    });
    body
}

fn json(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn next_job(State(state): State<SharedState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let mut state = state.lock();
    record(&mut state, &method, &uri, &body);
    match state.jobs.pop_front() {
        Some(job) => json(StatusCode::OK, job),
        None => json(StatusCode::NOT_FOUND, "{}".to_string()),
    }
}

async fn update_job(State(state): State<SharedState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let body = record(&mut state.lock(), &method, &uri, &body);
    json(StatusCode::OK, body)
}

async fn create_artifacts(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let mut state = state.lock();
    let body = record(&mut state, &method, &uri, &body);
    let count = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["artifacts"].as_array().map(Vec::len))
        .unwrap_or(0);
    let ids: Vec<serde_json::Value> = (0..count)
        .map(|_| {
            state.next_artifact += 1;
            serde_json::json!({ "id": format!("artifact-{}", state.next_artifact) })
        })
        .collect();
    json(StatusCode::OK, serde_json::Value::from(ids).to_string())
}

async fn upload_artifact(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    record(&mut state.lock(), &method, &uri, &body);
    json(StatusCode::OK, "{}".to_string())
}

async fn update_artifact(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    record(&mut state.lock(), &method, &uri, &body);
    json(StatusCode::OK, "{}".to_string())
}

async fn unknown(State(state): State<SharedState>, method: Method, uri: Uri, body: Bytes) -> Response {
    record(&mut state.lock(), &method, &uri, &body);
    json(StatusCode::NOT_FOUND, "{}".to_string())
}
