// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction so stage processors and the queue substrate are
//! deterministic under test.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of truth for "now", both monotonic (for timeouts/backoff) and
/// wall-clock (for timestamps persisted in events).
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn now_epoch_ms(&self) -> i64;
}

/// The real clock. Used everywhere outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_epoch_ms(&self) -> i64 {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        dur.as_millis() as i64
    }
}

/// A clock that only moves when told to. Lets tests assert on exact
/// timestamps and exercise stall/backoff/timeout windows without sleeping.
#[derive(Debug, Clone)]
pub struct FakeClock {
    instant: Arc<Mutex<Instant>>,
    epoch_ms: Arc<Mutex<i64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            instant: Arc::new(Mutex::new(Instant::now())),
            epoch_ms: Arc::new(Mutex::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = lock(&self.instant);
        *instant += by;
        let mut epoch = lock(&self.epoch_ms);
        *epoch += by.as_millis() as i64;
    }

    pub fn set_epoch_ms(&self, epoch_ms: i64) {
        *lock(&self.epoch_ms) = epoch_ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *lock(&self.instant)
    }

    fn now_epoch_ms(&self) -> i64 {
        *lock(&self.epoch_ms)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
