use super::*;
use redactflow_core::id::JobId;
use std::io::Write as _;
use tempfile::tempdir;

fn progress_event(job_id: &str, progress: u8) -> Event {
    Event::JobProgress {
        job_id: JobId::new(job_id),
        progress,
    }
}

#[test]
fn append_then_scan_round_trips_events_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let mut wal = Wal::open(&path).unwrap();
    wal.append(&progress_event("job-1", 10)).unwrap();
    wal.append(&progress_event("job-1", 50)).unwrap();
    wal.flush().unwrap();

    let mut reopened = Wal::open(&path).unwrap();
    let entries = reopened.scan().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[1].seq, 2);
}

#[test]
fn truncate_before_drops_old_entries_but_keeps_newer_ones() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let mut wal = Wal::open(&path).unwrap();
    for i in 0..5 {
        wal.append(&progress_event("job-1", i)).unwrap();
    }
    wal.truncate_before(3).unwrap();

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 4);
    assert_eq!(entries[1].seq, 5);
}

#[test]
fn corrupt_tail_line_is_rotated_aside_and_prefix_survives() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&progress_event("job-1", 10)).unwrap();
        wal.flush().unwrap();
    }
    // Simulate a torn write: append a line that isn't valid JSON.
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not valid json").unwrap();
    }

    let entries = read_valid_lines(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(path.with_extension("wal.bak").exists());

    // The live log now only has the good prefix, so further appends work.
    let mut wal = Wal::open(&path).unwrap();
    let rescanned = wal.scan().unwrap();
    assert_eq!(rescanned.len(), 1);
    wal.append(&progress_event("job-1", 20)).unwrap();
    wal.flush().unwrap();
    assert_eq!(wal.entries_after(0).unwrap().len(), 2);
}

#[test]
fn mark_processed_only_moves_forward() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let mut wal = Wal::open(&path).unwrap();
    wal.mark_processed(5);
    wal.mark_processed(2);
    assert_eq!(wal.processed_seq(), 5);
}
