// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log: the durable record of every [`redactflow_core::Event`].
//! One JSON object per line, fsync'd in small batches. On startup the log is
//! scanned and replayed into a `MaterializedState`; a truncated or corrupt
//! tail line stops replay at the last good line and rotates the remainder
//! aside rather than losing the whole log.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use redactflow_core::Event;
use thiserror::Error;

/// Batch up to this many appended events before an fsync.
const FLUSH_THRESHOLD: usize = 100;
/// ...or fsync at least this often, whichever comes first.
const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One logged event plus its position in the log, used by consumers that
/// track a `processed_seq` watermark separate from `write_seq`.
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    pending_since_flush: usize,
    last_flush: Instant,
}

impl Wal {
    /// Opens (creating if absent) the log at `path` without replaying it.
    /// Callers should call [`Wal::scan`] separately during startup so
    /// replay and live-append use the same entry type.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            write_seq: 0,
            processed_seq: 0,
            pending_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    /// Reads every valid line currently in the log. On hitting a line that
    /// fails to parse (a torn write from a crash mid-append), stops there,
    /// renames the file aside as `<path>.bak`, and starts a fresh log
    /// containing only the successfully replayed prefix.
    pub fn scan(&mut self) -> Result<Vec<WalEntry>, WalError> {
        let entries = read_valid_lines(&self.path)?;
        self.write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        Ok(entries)
    }

    /// Appends one event. Flush is deferred per [`FLUSH_THRESHOLD`] /
    /// [`FLUSH_INTERVAL`] so bursts of events amortize one fsync.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let seq = self.write_seq;
        let line = serde_json::to_string(&WireEntry { seq, event })?;
        writeln!(self.file, "{line}")?;
        self.pending_since_flush += 1;
        if self.needs_flush() {
            self.flush()?;
        }
        Ok(seq)
    }

    fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Entries strictly after `processed_seq`, for a consumer resuming from
    /// a checkpoint.
    pub fn entries_after(&self, seq: u64) -> Result<Vec<WalEntry>, WalError> {
        Ok(read_valid_lines(&self.path)?
            .into_iter()
            .filter(|e| e.seq > seq)
            .collect())
    }

    /// Compacts the log by dropping every entry at or before `seq`. Intended
    /// to run right after a snapshot covering up to `seq` has been durably
    /// written.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        self.flush()?;
        let remaining = read_valid_lines(&self.path)?
            .into_iter()
            .filter(|e| e.seq > seq)
            .collect::<Vec<_>>();

        let tmp_path = self.path.with_extension("wal.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            for entry in &remaining {
                let line = serde_json::to_string(&WireEntry {
                    seq: entry.seq,
                    event: &entry.event,
                })?;
                writeln!(tmp, "{line}")?;
            }
            tmp.flush()?;
            tmp.sync_data()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&self.path)?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct WireEntry<E> {
    seq: u64,
    #[serde(flatten)]
    event: E,
}

#[derive(serde::Deserialize)]
struct WireEntryOwned {
    seq: u64,
    #[serde(flatten)]
    event: Event,
}

/// Reads every syntactically valid line. A line that fails to parse (the
/// tail of a torn write) ends replay there: that line and everything after
/// it is rotated into `<path>.bak` instead of being discarded, so an
/// operator can inspect what was lost.
fn read_valid_lines(path: &Path) -> Result<Vec<WalEntry>, WalError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    let mut corrupt_from: Option<u64> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(_) => {
                corrupt_from = Some(line_no as u64);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WireEntryOwned>(&line) {
            Ok(parsed) => entries.push(WalEntry {
                seq: parsed.seq,
                event: parsed.event,
            }),
            Err(_) => {
                corrupt_from = Some(line_no as u64);
                break;
            }
        }
    }

    if corrupt_from.is_some() {
        rotate_corrupt_tail(path, &entries)?;
    }

    Ok(entries)
}

/// Backs up the whole (corrupt-tailed) log as `<path>.bak`, then rewrites
/// `path` to contain only the successfully replayed prefix, so the live
/// `Wal` can keep appending without its new writes landing after garbage
/// bytes.
fn rotate_corrupt_tail(path: &Path, good_entries: &[WalEntry]) -> Result<(), WalError> {
    let bak_path = path.with_extension("wal.bak");
    let mut src = File::open(path)?;
    let mut buf = Vec::new();
    src.seek(SeekFrom::Start(0))?;
    src.read_to_end(&mut buf)?;
    let mut bak = File::create(&bak_path)?;
    bak.write_all(&buf)?;
    bak.sync_data()?;

    let mut rewritten = File::create(path)?;
    for entry in good_entries {
        let line = serde_json::to_string(&WireEntry {
            seq: entry.seq,
            event: &entry.event,
        })?;
        writeln!(rewritten, "{line}")?;
    }
    rewritten.flush()?;
    rewritten.sync_data()?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
