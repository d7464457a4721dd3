// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process subscriber registry for the event fan-out. Every connected
//! `/events` stream holds a receiver paired with an entry here; publishing
//! takes the lock only long enough to clone the sender list, mirroring the
//! short-critical-section pattern the rest of this system uses around
//! shared state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use redactflow_core::{Clock, FanoutEvent, HeartbeatData, SubscriberId};
use tokio::sync::mpsc;

/// Frames buffered per subscriber before a slow consumer starts dropping
/// them. A dropped frame is never redelivered; `/status` polling remains
/// the reliable recovery path for a subscriber that fell behind.
const SUBSCRIBER_BUFFER: usize = 256;

#[derive(Clone)]
pub struct FanoutRegistry {
    subscribers: Arc<Mutex<HashMap<String, mpsc::Sender<FanoutEvent>>>>,
}

impl FanoutRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a new subscriber and returns the receiving half of its
    /// channel for the SSE handler to stream from.
    pub fn subscribe(&self, id: SubscriberId) -> mpsc::Receiver<FanoutEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers.lock().insert(id.into_inner(), tx);
        rx
    }

    pub fn unsubscribe(&self, id: &SubscriberId) {
        self.subscribers.lock().remove(id.as_str());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Publishes to every live subscriber. A subscriber whose channel is
    /// closed or full is dropped from the registry rather than blocking the
    /// publisher; backpressure is the subscriber's problem to keep up with,
    /// not the pipeline's to wait on.
    pub fn publish(&self, event: FanoutEvent) {
        let senders: Vec<(String, mpsc::Sender<FanoutEvent>)> = self
            .subscribers
            .lock()
            .iter()
            .map(|(id, tx)| (id.clone(), tx.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, tx) in senders {
            if tx.try_send(event.clone()).is_err() {
                dead.push(id);
            }
        }
        if !dead.is_empty() {
            let mut subscribers = self.subscribers.lock();
            for id in dead {
                subscribers.remove(&id);
            }
        }
    }
}

impl Default for FanoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically publishes a heartbeat frame so idle subscribers can tell a
/// quiet pipeline from a dead connection.
pub async fn run_heartbeat<C: Clock>(registry: FanoutRegistry, clock: C, interval: std::time::Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        registry.publish(FanoutEvent::Heartbeat(HeartbeatData {
            timestamp: clock.now_epoch_ms(),
        }));
    }
}
