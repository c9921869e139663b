use std::path::Path;

use chrono::{Duration, Utc};
use nudge_core::manager::TaskManager;
use nudge_core::notify::{HandlerPolicy, Notifier};
use nudge_core::platform::{MemoryHandle, MemoryPlatform};
use nudge_core::store::TaskStore;
use tempfile::tempdir;

fn open_manager(dir: &Path) -> (TaskManager, MemoryHandle) {
    let platform = MemoryPlatform::granted();
    let handle = platform.handle();
    let store = TaskStore::open(dir).expect("open store");
    let notifier =
        Notifier::new(Box::new(platform), HandlerPolicy::default()).expect("build notifier");
    (TaskManager::open(store, notifier), handle)
}

fn reload(dir: &Path) -> Vec<nudge_core::task::Task> {
    TaskStore::open(dir).expect("reopen store").load()
}

#[test]
fn add_edit_toggle_delete_scenario() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, handle) = open_manager(temp.path());
    let now = Utc::now();

    let id = manager
        .add("Buy milk", now)
        .expect("task created")
        .id
        .clone();
    assert_eq!(manager.tasks().len(), 1);
    assert!(!manager.tasks()[0].completed);
    assert!(manager.tasks()[0].reminder.is_none());
    assert_eq!(reload(temp.path()), manager.tasks());

    let fire_at = now + Duration::seconds(3600);
    let changed = manager
        .edit(&id, "Buy milk and eggs", Some(fire_at), now)
        .expect("edit succeeds");
    assert!(changed);
    assert_eq!(manager.tasks()[0].title, "Buy milk and eggs");
    assert_eq!(manager.tasks()[0].reminder, Some(fire_at));
    assert_eq!(reload(temp.path()), manager.tasks());

    let scheduled = handle.scheduled_for(&id);
    assert_eq!(scheduled.len(), 1);
    let delay = (scheduled[0].fire_at - now).num_seconds();
    assert!((3595..=3605).contains(&delay), "delay was {delay}");
    assert_eq!(scheduled[0].payload.body, "Buy milk and eggs");

    assert!(manager.toggle(&id));
    assert!(manager.tasks()[0].completed);
    assert_eq!(reload(temp.path()), manager.tasks());

    assert!(manager.delete(&id).expect("delete succeeds"));
    assert!(manager.tasks().is_empty());
    assert!(handle.scheduled_for(&id).is_empty());
    assert_eq!(reload(temp.path()), manager.tasks());
}

#[test]
fn blank_titles_are_ignored() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, _handle) = open_manager(temp.path());
    let now = Utc::now();

    assert!(manager.add("", now).is_none());
    assert!(manager.add("   ", now).is_none());
    assert!(manager.tasks().is_empty());
}

#[test]
fn toggle_twice_restores_completed() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, _handle) = open_manager(temp.path());
    let now = Utc::now();

    let id = manager.add("Practice piano", now).expect("task").id.clone();

    assert!(manager.toggle(&id));
    assert!(manager.toggle(&id));
    assert!(!manager.tasks()[0].completed);
}

#[test]
fn toggle_unknown_id_changes_nothing() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, _handle) = open_manager(temp.path());
    let now = Utc::now();

    manager.add("Practice piano", now).expect("task");
    let before = manager.tasks().to_vec();

    assert!(!manager.toggle("no-such-id"));
    assert_eq!(manager.tasks(), before.as_slice());
}

#[test]
fn edit_to_no_reminder_cancels_the_notification() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, handle) = open_manager(temp.path());
    let now = Utc::now();

    let id = manager.add("Send the invoice", now).expect("task").id.clone();
    let fire_at = now + Duration::hours(2);

    manager
        .edit(&id, "Send the invoice", Some(fire_at), now)
        .expect("edit with reminder");
    assert_eq!(handle.scheduled_for(&id).len(), 1);

    manager
        .edit(&id, "Send the invoice", None, now)
        .expect("edit without reminder");
    assert!(handle.scheduled_for(&id).is_empty());
    assert!(manager.tasks()[0].reminder.is_none());
}

#[test]
fn edit_cancels_then_reschedules_even_when_unchanged() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, handle) = open_manager(temp.path());
    let now = Utc::now();

    let id = manager.add("Renew passport", now).expect("task").id.clone();
    let fire_at = now + Duration::days(1);

    manager
        .edit(&id, "Renew passport", Some(fire_at), now)
        .expect("first edit");
    let first = handle.scheduled_for(&id);
    assert_eq!(first.len(), 1);

    manager
        .edit(&id, "Renew passport", Some(fire_at), now)
        .expect("second edit");
    let second = handle.scheduled_for(&id);
    assert_eq!(second.len(), 1);

    // The old registration was cancelled and a fresh one made, so the host
    // identifier changes even though nothing else did.
    assert_ne!(first[0].identifier, second[0].identifier);
}

#[test]
fn past_reminder_is_stored_but_never_scheduled() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, handle) = open_manager(temp.path());
    let now = Utc::now();

    let id = manager.add("Water the plants", now).expect("task").id.clone();
    let past = now - Duration::hours(1);

    let changed = manager
        .edit(&id, "Water the plants", Some(past), now)
        .expect("edit with past reminder");
    assert!(changed);
    assert_eq!(manager.tasks()[0].reminder, Some(past));
    assert!(handle.scheduled().is_empty());
    assert_eq!(reload(temp.path()), manager.tasks());
}

#[test]
fn delete_removes_exactly_the_matching_task() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, handle) = open_manager(temp.path());
    let now = Utc::now();

    let first = manager.add("First", now).expect("task").id.clone();
    let second = manager
        .add("Second", now + Duration::milliseconds(1))
        .expect("task")
        .id
        .clone();
    manager
        .edit(&second, "Second", Some(now + Duration::hours(1)), now)
        .expect("edit");

    assert!(manager.delete(&second).expect("delete"));
    assert_eq!(manager.tasks().len(), 1);
    assert_eq!(manager.tasks()[0].id, first);
    assert!(handle.scheduled_for(&second).is_empty());

    assert!(!manager.delete("no-such-id").expect("delete unknown"));
    assert_eq!(manager.tasks().len(), 1);
}

#[test]
fn same_millisecond_adds_get_distinct_ids() {
    let temp = tempdir().expect("tempdir");
    let (mut manager, _handle) = open_manager(temp.path());
    let now = Utc::now();

    let first = manager.add("One", now).expect("task").id.clone();
    let second = manager.add("Two", now).expect("task").id.clone();

    assert_ne!(first, second);
    assert_eq!(manager.tasks().len(), 2);
}

#[test]
fn list_survives_a_restart() {
    let temp = tempdir().expect("tempdir");
    let now = Utc::now();

    {
        let (mut manager, _handle) = open_manager(temp.path());
        manager.add("Pack for the trip", now).expect("task");
        manager
            .add("Check in online", now + Duration::milliseconds(1))
            .expect("task");
    }

    let (manager, _handle) = open_manager(temp.path());
    assert_eq!(manager.tasks().len(), 2);
    assert_eq!(manager.tasks()[0].title, "Pack for the trip");
    assert_eq!(manager.tasks()[1].title, "Check in online");
}
