use std::fs;

use chrono::{TimeZone, Utc};
use nudge_core::store::TaskStore;
use nudge_core::task::Task;
use tempfile::tempdir;

fn sample_tasks() -> Vec<Task> {
    let reminder = Utc
        .with_ymd_and_hms(2030, 5, 10, 8, 30, 0)
        .single()
        .expect("valid timestamp");

    let mut done = Task::new("1754500000001".to_string(), "Water the plants".to_string());
    done.completed = true;

    let mut with_reminder = Task::new("1754500000002".to_string(), "Call the dentist".to_string());
    with_reminder.reminder = Some(reminder);

    vec![
        Task::new("1754500000000".to_string(), "Buy milk".to_string()),
        done,
        with_reminder,
    ]
}

#[test]
fn save_then_load_reproduces_the_list() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    let tasks = sample_tasks();
    store.save(&tasks).expect("save tasks");

    let loaded = store.load();
    assert_eq!(loaded, tasks);
}

#[test]
fn missing_blob_loads_as_empty() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    assert!(store.load().is_empty());
}

#[test]
fn unparsable_blob_loads_as_empty() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    fs::write(&store.tasks_path, "this is not json").expect("write garbage");
    assert!(store.load().is_empty());
}

#[test]
fn save_replaces_the_whole_blob() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    store.save(&sample_tasks()).expect("save three");
    store
        .save(&[Task::new("1".to_string(), "Only one left".to_string())])
        .expect("save one");

    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "Only one left");
}

#[test]
fn blob_is_a_json_array_of_task_records() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    store.save(&sample_tasks()).expect("save tasks");

    let raw = fs::read_to_string(&store.tasks_path).expect("read blob");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("blob parses");
    let records = value.as_array().expect("blob is an array");
    assert_eq!(records.len(), 3);

    let first = records[0].as_object().expect("record is an object");
    assert!(first.contains_key("id"));
    assert!(first.contains_key("title"));
    assert!(first.contains_key("completed"));
    assert!(first["reminder"].is_null());

    let third = records[2].as_object().expect("record is an object");
    let reminder_raw = third["reminder"].as_str().expect("reminder is a string");
    let reminder = chrono::DateTime::parse_from_rfc3339(reminder_raw).expect("ISO-8601 reminder");
    assert_eq!(
        reminder.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2030, 5, 10, 8, 30, 0)
            .single()
            .expect("valid timestamp")
    );
}
