use super::*;
use std::thread;

#[test]
fn lookup_on_empty_tracker_is_none() {
    let tracker = VehicleTracker::new();
    assert!(tracker.is_empty());
    assert_eq!(tracker.lookup("VAN-1"), None);
}

#[test]
fn first_record_creates_entry_with_delta_as_total() {
    let mut tracker = VehicleTracker::new();
    tracker.record("VAN-1", 40.0, -74.0, 0.0);

    let state = tracker.lookup("VAN-1").unwrap();
    assert_eq!(state.last_latitude, 40.0);
    assert_eq!(state.last_longitude, -74.0);
    assert_eq!(state.cumulative_distance_km, 0.0);
    assert_eq!(tracker.len(), 1);
}

#[test]
fn subsequent_records_move_and_accumulate() {
    let mut tracker = VehicleTracker::new();
    tracker.record("VAN-1", 40.0, -74.0, 0.0);
    tracker.record("VAN-1", 40.1, -74.1, 1.5);
    tracker.record("VAN-1", 40.2, -74.2, 2.25);

    let state = tracker.lookup("VAN-1").unwrap();
    assert_eq!(state.last_position(), Position::new(40.2, -74.2));
    assert_eq!(state.cumulative_distance_km, 3.75);
    assert_eq!(tracker.len(), 1);
}

#[test]
fn vehicles_are_tracked_independently() {
    let mut tracker = VehicleTracker::new();
    tracker.record("VAN-1", 1.0, 1.0, 0.0);
    tracker.record("VAN-2", 2.0, 2.0, 0.0);
    tracker.record("VAN-1", 1.5, 1.5, 4.0);

    assert_eq!(tracker.lookup("VAN-1").unwrap().cumulative_distance_km, 4.0);
    assert_eq!(tracker.lookup("VAN-2").unwrap().cumulative_distance_km, 0.0);

    let mut ids: Vec<&str> = tracker.iter().map(|(id, _)| id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["VAN-1", "VAN-2"]);
}

#[test]
fn owned_handle_writes_through() {
    let mut handle = TrackerHandle::from(VehicleTracker::new());
    handle.with(|tracker| tracker.record("VAN-1", 0.0, 0.0, 1.0));
    assert_eq!(handle.lookup("VAN-1").unwrap().cumulative_distance_km, 1.0);
}

#[test]
fn shared_handles_see_each_others_writes() {
    let shared = SharedTracker::new();
    let mut a = TrackerHandle::from(shared.clone());
    let mut b = TrackerHandle::from(shared.clone());

    a.with(|tracker| tracker.record("VAN-1", 0.0, 0.0, 1.0));
    b.with(|tracker| tracker.record("VAN-1", 0.0, 1.0, 2.0));

    assert_eq!(a.lookup("VAN-1").unwrap().cumulative_distance_km, 3.0);
    assert_eq!(shared.len(), 1);
}

#[test]
fn concurrent_updates_on_shared_tracker_are_not_lost() {
    const THREADS: usize = 8;
    const UPDATES: usize = 1_000;

    let shared = SharedTracker::new();
    thread::scope(|s| {
        for _ in 0..THREADS {
            let mut handle = TrackerHandle::from(shared.clone());
            s.spawn(move || {
                for _ in 0..UPDATES {
                    handle.with(|tracker| {
                        let delta = if tracker.lookup("VAN-1").is_some() {
                            1.0
                        } else {
                            0.0
                        };
                        tracker.record("VAN-1", 0.0, 0.0, delta);
                    });
                }
            });
        }
    });

    let total = shared.lookup("VAN-1").unwrap().cumulative_distance_km;
    assert_eq!(total, (THREADS * UPDATES - 1) as f64);
}

#[test]
fn scopes_parse_from_cli_names() {
    assert_eq!("per-stream".parse(), Ok(TrackerScope::PerStream));
    assert_eq!("SHARED".parse(), Ok(TrackerScope::Shared));
    assert!("global".parse::<TrackerScope>().is_err());
    assert_eq!(TrackerScope::default().to_string(), "per-stream");
}
