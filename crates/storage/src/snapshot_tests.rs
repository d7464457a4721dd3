use super::*;
use redactflow_core::test_support::sample_dataset;
use tempfile::tempdir;

#[test]
fn snapshot_round_trips_through_disk() {
    let mut state = MaterializedState::new();
    let dataset = sample_dataset("ds-1");
    state.datasets.insert(dataset.id.as_str().to_string(), dataset);

    let snapshot = Snapshot::from_state(&state, 7);
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    snapshot.write_to(&path).unwrap();

    let loaded = Snapshot::read_from(&path).unwrap().unwrap();
    assert_eq!(loaded.covers_up_to_seq, 7);
    let restored = loaded.into_state();
    assert!(restored.datasets.contains_key("ds-1"));
}

#[test]
fn missing_snapshot_file_returns_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");
    assert!(Snapshot::read_from(&path).unwrap().is_none());
}
