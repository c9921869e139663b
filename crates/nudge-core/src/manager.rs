use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::notify::Notifier;
use crate::store::TaskStore;
use crate::task::{Task, fresh_id};

/// The in-memory task list and its two collaborators. Every mutating
/// operation ends by writing the full list back through the store, so the
/// persisted blob never lags the in-memory state by more than one write.
pub struct TaskManager {
    tasks: Vec<Task>,
    store: TaskStore,
    notifier: Notifier,
}

impl TaskManager {
    #[instrument(skip(store, notifier))]
    pub fn open(store: TaskStore, notifier: Notifier) -> Self {
        let tasks = store.load();
        info!(count = tasks.len(), "loaded task list");

        Self {
            tasks,
            store,
            notifier,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Appends a task with a fresh id, not completed, no reminder. An empty
    /// (after trim) title is a silent no-op.
    #[instrument(skip(self, title, now))]
    pub fn add(&mut self, title: &str, now: DateTime<Utc>) -> Option<&Task> {
        if title.trim().is_empty() {
            debug!("empty title; ignoring add");
            return None;
        }

        let id = fresh_id(&self.tasks, now);
        self.tasks.push(Task::new(id, title.to_string()));
        self.persist();

        self.tasks.last()
    }

    /// Flips `completed` on the matching task. An unknown id leaves the
    /// list unchanged; the list is written back either way.
    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: &str) -> bool {
        let mut found = false;
        for task in &mut self.tasks {
            if task.id == id {
                task.completed = !task.completed;
                found = true;
            }
        }
        if !found {
            debug!(id, "toggle: no matching task");
        }

        self.persist();
        found
    }

    /// Removes the matching task. A task holding a reminder has its
    /// notification cancelled before the task disappears, so a failed
    /// cancel aborts the delete rather than leaving an alert behind for a
    /// task that no longer exists.
    #[instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let had_reminder = self
            .tasks
            .iter()
            .any(|task| task.id == id && task.reminder.is_some());
        if had_reminder {
            self.notifier.cancel_reminder(id)?;
        }

        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() < before;
        if !removed {
            debug!(id, "delete: no matching task");
        }

        self.persist();
        Ok(removed)
    }

    /// Replaces title and reminder. Any existing reminder is cancelled
    /// first, even when the new value is identical. A new notification is
    /// scheduled only for a strictly future reminder, after the list has
    /// already been written back; the reminder field keeps whatever value
    /// was set regardless of the timing condition.
    #[instrument(skip(self, new_title, new_reminder, now))]
    pub fn edit(
        &mut self,
        id: &str,
        new_title: &str,
        new_reminder: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        if new_title.trim().is_empty() {
            debug!("empty title; ignoring edit");
            return Ok(false);
        }

        let Some(idx) = self.tasks.iter().position(|task| task.id == id) else {
            debug!(id, "edit: no matching task");
            return Ok(false);
        };

        if self.tasks[idx].reminder.is_some() {
            self.notifier.cancel_reminder(id)?;
        }

        self.tasks[idx].title = new_title.to_string();
        self.tasks[idx].reminder = new_reminder;
        self.persist();

        if let Some(fire_at) = new_reminder
            && fire_at > now
        {
            self.notifier.schedule_reminder(id, new_title, fire_at, now)?;
        }

        Ok(true)
    }

    /// Write failures are logged and swallowed; the next successful write
    /// still carries the latest in-memory state.
    fn persist(&self) {
        if let Err(err) = self.store.save(&self.tasks) {
            warn!(error = %err, "failed to save tasks");
        }
    }
}
