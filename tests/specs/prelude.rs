// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications: a black-box harness that
//! spawns `redactflowd` against a scratch state directory, talks to it over
//! HTTP, and drives `redactflow` (the CLI) as a subprocess.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

// Spec polling timeouts. Generous relative to the teacher's own numbers
// because these specs wait on a real worker pool driving jobs through the
// four stage processors, not an in-memory step machine.
pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale (e.g. compiled by a removed worktree into a
/// shared target directory).
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

fn daemon_binary() -> PathBuf {
    binary_path("redactflowd")
}

fn cli_binary() -> PathBuf {
    binary_path("redactflow")
}

/// Create a CLI builder for `redactflow` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions.
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self { args: Vec::new(), envs: Vec::new() }
    }

    /// Add CLI arguments.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Point the CLI at a running daemon.
    pub fn daemon(mut self, daemon: &DaemonHandle) -> Self {
        self.envs.push(("REDACTFLOW_URL".to_string(), daemon.base_url.clone()));
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.envs.push((key.to_string(), value.into()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(cli_binary());
        cmd.args(&self.args);
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("redactflow should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code).
    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("redactflow should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions.
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
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// Polls `condition` until it returns true or `timeout_ms` elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Daemon
// =============================================================================

/// A running `redactflowd` bound to an ephemeral port over a scratch state
/// directory, torn down when dropped.
pub struct DaemonHandle {
    child: Child,
    pub base_url: String,
    _state_dir: tempfile::TempDir,
}

impl DaemonHandle {
    /// Starts a daemon with default environment, waiting for it to print
    /// `READY` on stdout. `env_overrides` lets a spec tune things like
    /// `REDACTFLOW_QUEUE_MAX_DEPTH` or `REDACTFLOW_STORAGE_MAX_FILE_SIZE`
    /// without real external services running behind the detector/
    /// extraction/OCR URLs.
    pub fn start(env_overrides: &[(&str, &str)]) -> Self {
        let state_dir = tempfile::tempdir().expect("tempdir");

        let mut cmd = Command::new(daemon_binary());
        cmd.env("REDACTFLOW_STATE_DIR", state_dir.path())
            .env("REDACTFLOW_LISTEN_ADDR", "127.0.0.1:0")
            .env("REDACTFLOW_SSE_ENABLED", "false")
            .env("REDACTFLOW_DETECTOR_URL", "http://127.0.0.1:1")
            .env("REDACTFLOW_ANONYMIZER_URL", "http://127.0.0.1:1")
            .env("REDACTFLOW_DOCUMENT_EXTRACTOR_URL", "http://127.0.0.1:1")
            .env("REDACTFLOW_OCR_URL", "http://127.0.0.1:1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env_overrides {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().expect("redactflowd should spawn");
        let stdout = child.stdout.take().expect("piped stdout");
        let mut lines = BufReader::new(stdout).lines();

        let mut base_url = None;
        let deadline = std::time::Instant::now() + Duration::from_millis(SPEC_WAIT_MAX_MS);
        while std::time::Instant::now() < deadline {
            match lines.next() {
                Some(Ok(line)) => {
                    if let Some(addr) = line.strip_prefix("LISTENING ") {
                        base_url = Some(format!("http://{addr}"));
                    }
                    if line == "READY" {
                        break;
                    }
                }
                _ => break,
            }
        }

        let base_url = base_url.unwrap_or_else(|| {
            let _ = child.kill();
            panic!("redactflowd did not report a listening address before READY");
        });

        Self { child, base_url, _state_dir: state_dir }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for DaemonHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Runs a one-off async HTTP call on a fresh current-thread runtime. Specs
/// are sequential black-box processes, not throughput benchmarks, so paying
/// a runtime per call keeps each test self-contained.
fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
        .block_on(fut)
}

pub fn http_post(url: &str, body: &serde_json::Value) -> (u16, serde_json::Value) {
    block_on(async {
        let resp = reqwest::Client::new().post(url).json(body).send().await.expect("post should reach the daemon");
        let status = resp.status().as_u16();
        let json = resp.json::<serde_json::Value>().await.unwrap_or(serde_json::Value::Null);
        (status, json)
    })
}

pub fn http_get(url: &str) -> (u16, serde_json::Value) {
    block_on(async {
        let resp = reqwest::Client::new().get(url).send().await.expect("get should reach the daemon");
        let status = resp.status().as_u16();
        let json = resp.json::<serde_json::Value>().await.unwrap_or(serde_json::Value::Null);
        (status, json)
    })
}
