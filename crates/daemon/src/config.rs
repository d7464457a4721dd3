// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: loaded from environment variables with typed
//! defaults, following the same env/default-path pattern as a user-level
//! daemon that has no project root to read config from.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use redactflow_engine::{backoff::parse_duration, DEFAULT_CONCURRENCY_PER_QUEUE, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory: set REDACTFLOW_STATE_DIR or HOME")]
    NoStateDir,
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Default accept ceiling for `storage.maxFileSize`: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
/// Default truncate ceiling for `extraction.maxTextLength`: 10 MiB, matching
/// the router's own built-in default.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10 * 1024 * 1024;
/// Default `worker.queue.maxDepth`: 1000 waiting jobs per queue before
/// enqueues fail fast with `kind=queue_full`.
pub const DEFAULT_MAX_QUEUE_DEPTH: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_path: PathBuf,
    pub listen_addr: SocketAddr,

    pub worker_concurrency: usize,
    pub worker_retry_attempts: u32,
    pub worker_retry_delay: Duration,

    pub storage_max_file_size: u64,
    pub extraction_max_text_length: usize,
    pub queue_max_depth: usize,

    /// Accepted as configuration surface per the external interfaces
    /// contract, but unused: this implementation's queue transport is the
    /// file-backed WAL, not Redis.
    pub redis_url: Option<String>,

    pub detector_url: String,
    pub anonymizer_url: String,
    pub document_extractor_url: String,
    pub ocr_url: String,

    pub sse_enabled: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration for the daemon from its environment, falling
    /// back to sane defaults for anything unset.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;

        let worker_retry_delay = match env_var("REDACTFLOW_WORKER_RETRY_DELAY") {
            Some(raw) => parse_duration(&raw).map_err(|_| ConfigError::InvalidValue {
                key: "REDACTFLOW_WORKER_RETRY_DELAY",
                value: raw,
            })?,
            None => DEFAULT_RETRY_BASE_DELAY,
        };

        let listen_addr = match env_var("REDACTFLOW_LISTEN_ADDR") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "REDACTFLOW_LISTEN_ADDR",
                value: raw,
            })?,
            None => ([127, 0, 0, 1], 8080).into(),
        };

        Ok(Self {
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
            log_path: state_dir.join("daemon.log"),
            listen_addr,
            worker_concurrency: env_parsed("REDACTFLOW_WORKER_CONCURRENCY", DEFAULT_CONCURRENCY_PER_QUEUE)?,
            worker_retry_attempts: env_parsed("REDACTFLOW_WORKER_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?,
            worker_retry_delay,
            storage_max_file_size: env_parsed("REDACTFLOW_STORAGE_MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?,
            extraction_max_text_length: env_parsed("REDACTFLOW_EXTRACTION_MAX_TEXT_LENGTH", DEFAULT_MAX_TEXT_LENGTH)?,
            queue_max_depth: env_parsed("REDACTFLOW_QUEUE_MAX_DEPTH", DEFAULT_MAX_QUEUE_DEPTH)?,
            redis_url: env_var("REDACTFLOW_REDIS_URL"),
            detector_url: env_var("REDACTFLOW_DETECTOR_URL").unwrap_or_else(|| "http://127.0.0.1:5001".to_string()),
            anonymizer_url: env_var("REDACTFLOW_ANONYMIZER_URL").unwrap_or_else(|| "http://127.0.0.1:5002".to_string()),
            document_extractor_url: env_var("REDACTFLOW_DOCUMENT_EXTRACTOR_URL")
                .unwrap_or_else(|| "http://127.0.0.1:9998".to_string()),
            ocr_url: env_var("REDACTFLOW_OCR_URL").unwrap_or_else(|| "http://127.0.0.1:9999".to_string()),
            sse_enabled: env_parsed("REDACTFLOW_SSE_ENABLED", true)?,
            log_level: env_var("REDACTFLOW_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: match env_var("REDACTFLOW_LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                Some("text") | None => LogFormat::Text,
                Some(other) => {
                    return Err(ConfigError::InvalidValue {
                        key: "REDACTFLOW_LOG_FORMAT",
                        value: other.to_string(),
                    })
                }
            },
            state_dir,
        })
    }
}

/// Resolve state directory: `REDACTFLOW_STATE_DIR` > `XDG_STATE_HOME/redactflow` >
/// `~/.local/state/redactflow`.
fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env_var("REDACTFLOW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = env_var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("redactflow"));
    }
    let home = env_var("HOME").ok_or(ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/redactflow"))
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_var(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}
