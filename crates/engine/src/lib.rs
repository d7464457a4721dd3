// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline's run loop: the queue substrate, the four stage processors,
//! effect application against durable state, and the worker pools that drive
//! jobs from reservation through completion.
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod backoff;
pub mod effect;
pub mod executor;
pub mod processors;
pub mod queue;
pub mod retention;
pub mod scheduler;
pub mod worker;

pub use backoff::{backoff_delay, parse_duration};
pub use effect::Effect;
pub use executor::{ExecuteError, Executor};
pub use processors::{
    process_anonymization, process_file_processing, process_pii_analysis, process_text_extraction, FileReader,
    FileStat, LocalFileReader, NoPolicyDocumentSource, PolicyDocumentSource, ProcessorDeps,
};
pub use queue::{
    ack_effects, cancel_request_effects, is_stalled, nack_effects, reservation_effects, reserve_next, retry_effects,
    stall_effects, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY, DEFAULT_STALL_WINDOW,
};
pub use retention::{jobs_to_purge, KEEP_LAST_COMPLETED, KEEP_LAST_FAILED};
pub use scheduler::Scheduler;
pub use worker::{run_one, WorkerPool, DEFAULT_CONCURRENCY_PER_QUEUE, DEFAULT_HARD_TIMEOUT};

#[cfg(any(test, feature = "test-support"))]
pub use processors::FakeFileReader;
