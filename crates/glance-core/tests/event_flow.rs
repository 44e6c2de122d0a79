use chrono::{Duration, TimeZone, Utc};
use glance_core::date::parse_date_key;
use glance_core::event::Event;
use glance_core::layout::layout;
use glance_core::store::EventStore;
use glance_shared::Tone;
use tempfile::tempdir;

fn event(label: &str, start: &str, end: &str, created_offset_s: i64) -> Event {
    let base = Utc
        .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .expect("valid base");
    Event::new(
        label.to_string(),
        parse_date_key(start).expect("start"),
        parse_date_key(end).expect("end"),
        Tone::Sea,
        base + Duration::seconds(created_offset_s),
    )
}

#[test]
fn store_roundtrip_feeds_layout() {
    let temp = tempdir().expect("tempdir");
    let store = EventStore::open(temp.path()).expect("open store");

    let conference = event("Conference", "2026-01-01", "2026-01-10", 0);
    let offsite = event("Offsite", "2026-01-05", "2026-01-06", 60);
    store.add(conference.clone()).expect("add conference");
    store.add(offsite.clone()).expect("add offsite");

    let events = store.load().expect("load events");
    assert_eq!(events.len(), 2);

    let result = layout(2026, 7, &events).expect("layout");
    // The conference crosses the first row boundary, the offsite
    // overlaps its second segment.
    assert_eq!(result.segments.len(), 3);
    assert_eq!(result.depth(1), 2);
    let offsite_segment = result
        .segments
        .iter()
        .find(|s| s.event_id == offsite.id)
        .expect("offsite segment");
    assert_eq!(offsite_segment.stack, 1);
}

#[test]
fn update_remove_and_undo() {
    let temp = tempdir().expect("tempdir");
    let store = EventStore::open(temp.path()).expect("open store");

    let trip = event("Trip", "2026-06-15", "2026-06-10", 0);
    // The reversed range was swapped on construction.
    assert!(trip.start <= trip.end);
    store.add(trip.clone()).expect("add trip");

    let mut edited = trip.clone();
    edited.label = "Road trip".to_string();
    store.update(edited).expect("update trip");
    let events = store.load().expect("load after update");
    assert_eq!(events[0].label, "Road trip");

    store.push_undo_snapshot().expect("snapshot");
    store.remove(trip.id).expect("remove trip");
    assert!(store.load().expect("load after remove").is_empty());

    let restored = store
        .pop_undo_snapshot()
        .expect("pop snapshot")
        .expect("snapshot present");
    store.save(&restored).expect("restore");
    let events = store.load().expect("load after undo");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].label, "Road trip");
}

#[test]
fn missing_event_operations_fail() {
    let temp = tempdir().expect("tempdir");
    let store = EventStore::open(temp.path()).expect("open store");
    let ghost = event("Ghost", "2026-03-01", "2026-03-02", 0);
    assert!(store.update(ghost.clone()).is_err());
    assert!(store.remove(ghost.id).is_err());
    assert!(store.pop_undo_snapshot().expect("pop").is_none());
}
