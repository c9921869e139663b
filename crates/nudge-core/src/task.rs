use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub reminder: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            completed: false,
            reminder: None,
        }
    }
}

/// Ids are the creation timestamp in milliseconds. The candidate is bumped
/// until it collides with nothing, so two tasks created within the same
/// millisecond still get distinct ids.
pub fn fresh_id(existing: &[Task], now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if !existing.iter().any(|task| task.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}
