// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applies effects: events are applied to materialized state and persisted
//! to the WAL; timers are armed or disarmed on the scheduler.

use std::sync::Arc;

use parking_lot::Mutex;
use redactflow_core::{Clock, Event};
use redactflow_storage::{MaterializedState, Wal, WalError};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::effect::Effect;
use crate::scheduler::Scheduler;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("storage error: {0}")]
    Storage(#[from] WalError),
}

pub struct Executor<C: Clock> {
    state: Arc<Mutex<MaterializedState>>,
    wal: Arc<Mutex<Wal>>,
    scheduler: Arc<Mutex<Scheduler>>,
    clock: C,
    event_sink: Option<broadcast::Sender<Event>>,
}

impl<C: Clock> Executor<C> {
    pub fn new(state: Arc<Mutex<MaterializedState>>, wal: Arc<Mutex<Wal>>, scheduler: Arc<Mutex<Scheduler>>, clock: C) -> Self {
        Self { state, wal, scheduler, clock, event_sink: None }
    }

    /// Attaches a broadcast sink every applied event is published to, after
    /// it's durable in the WAL. The event fan-out subscribes from the other
    /// end; this is the only place pipeline events cross from the queue
    /// substrate into push delivery.
    pub fn with_event_sink(mut self, sink: broadcast::Sender<Event>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> Arc<Mutex<MaterializedState>> {
        Arc::clone(&self.state)
    }

    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        Arc::clone(&self.scheduler)
    }

    /// Executes one effect with tracing, mirroring the span-per-effect
    /// pattern used for stage processors.
    pub async fn execute(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        let op_name = effect.name();
        let span = tracing::info_span!("effect", effect = op_name);
        let _guard = span.enter();
        tracing::info!(fields = ?effect.fields(), "executing");

        let start = std::time::Instant::now();
        let result = self.execute_inner(effect).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(event) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, has_event = event.is_some(), "completed"),
            Err(e) => tracing::error!(elapsed_ms = elapsed.as_millis() as u64, error = %e, "failed"),
        }
        result
    }

    async fn execute_inner(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        match effect {
            Effect::Emit { event } => {
                {
                    let mut state = self.state.lock();
                    state.apply_event(&event);
                }
                {
                    let mut wal = self.wal.lock();
                    wal.append(&event)?;
                }
                if let Some(sink) = &self.event_sink {
                    let _ = sink.send(event.clone());
                }
                Ok(Some(event))
            }
            Effect::SetTimer { id, duration } => {
                let now = self.clock.now();
                self.scheduler.lock().set_timer(id, duration, now);
                Ok(None)
            }
            Effect::CancelTimer { id } => {
                self.scheduler.lock().cancel_timer(&id);
                Ok(None)
            }
        }
    }

    pub async fn execute_all(&self, effects: Vec<Effect>) -> Result<Vec<Event>, ExecuteError> {
        let mut events = Vec::new();
        for effect in effects {
            if let Some(event) = self.execute(effect).await? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
