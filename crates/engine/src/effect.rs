// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects the executor performs on behalf of a stage processor: state
//! mutation (via event emission) and timer bookkeeping. The actual external
//! calls (extraction, detection, anonymization) are awaited directly inside
//! each stage processor rather than dispatched as effects, since they return
//! data the processor needs before it can decide its next effect.

use std::time::Duration;

use redactflow_core::Event;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Apply an event to materialized state and persist it to the WAL.
    Emit { event: Event },
    /// Arm a timer (reservation deadline, hard timeout, stall check).
    SetTimer { id: String, duration: Duration },
    /// Disarm a previously armed timer.
    CancelTimer { id: String },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Emit { .. } => "emit",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit { event } => vec![("event", event.name().to_string())],
            Effect::SetTimer { id, duration } => {
                vec![("id", id.clone()), ("duration_ms", duration.as_millis().to_string())]
            }
            Effect::CancelTimer { id } => vec![("id", id.clone())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redactflow_core::{test_support::sample_job, JobKind};

    #[test]
    fn emit_effect_reports_the_event_name() {
        let job = sample_job("job-1", JobKind::FileProcessing, "dataset-1");
        let effect = Effect::Emit {
            event: Event::JobEnqueued { job },
        };
        assert_eq!(effect.name(), "emit");
        assert_eq!(effect.fields(), vec![("event", "job_enqueued".to_string())]);
    }

    #[test]
    fn set_timer_reports_id_and_duration() {
        let effect = Effect::SetTimer {
            id: "stall:job-1".to_string(),
            duration: Duration::from_secs(30),
        };
        assert_eq!(effect.name(), "set_timer");
        assert_eq!(
            effect.fields(),
            vec![("id", "stall:job-1".to_string()), ("duration_ms", "30000".to_string())]
        );
    }
}
