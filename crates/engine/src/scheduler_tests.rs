use std::time::{Duration, Instant};

use super::*;

#[test]
fn timer_fires_once_its_duration_has_elapsed() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();
    scheduler.set_timer("stall:job-1", Duration::from_secs(30), start);

    assert!(scheduler.fired_timers(start).is_empty());
    let fired = scheduler.fired_timers(start + Duration::from_secs(31));
    assert_eq!(fired, vec!["stall:job-1".to_string()]);
    assert!(!scheduler.has_timers());
}

#[test]
fn cancel_removes_a_pending_timer() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();
    scheduler.set_timer("hard-timeout:job-1", Duration::from_secs(5), start);
    scheduler.cancel_timer("hard-timeout:job-1");
    assert!(scheduler.fired_timers(start + Duration::from_secs(10)).is_empty());
}

#[test]
fn cancel_by_prefix_removes_all_matching_timers() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();
    scheduler.set_timer("stall:job-1", Duration::from_secs(1), start);
    scheduler.set_timer("stall:job-2", Duration::from_secs(1), start);
    scheduler.set_timer("hard-timeout:job-1", Duration::from_secs(1), start);
    scheduler.cancel_timers_with_prefix("stall:");
    let fired = scheduler.fired_timers(start + Duration::from_secs(2));
    assert_eq!(fired, vec!["hard-timeout:job-1".to_string()]);
}

#[test]
fn next_deadline_is_the_earliest_pending_timer() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();
    scheduler.set_timer("a", Duration::from_secs(10), start);
    scheduler.set_timer("b", Duration::from_secs(2), start);
    assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_secs(2)));
}

#[test]
fn is_armed_reflects_pending_and_fired_timers() {
    let mut scheduler = Scheduler::new();
    let start = Instant::now();
    scheduler.set_timer("retry-delay:job-1", Duration::from_secs(5), start);
    assert!(scheduler.is_armed("retry-delay:job-1"));
    scheduler.fired_timers(start + Duration::from_secs(6));
    assert!(!scheduler.is_armed("retry-delay:job-1"));
}
