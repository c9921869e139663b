use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::task::Task;

const TASKS_FILE: &str = "tasks.json";

/// Whole-list persistence: one JSON array in one file. Fine at this scale;
/// there is no indexing and no incremental update.
#[derive(Debug)]
pub struct TaskStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
}

impl TaskStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join(TASKS_FILE);

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            "opened task store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
        })
    }

    /// The caller always gets a usable list. A missing blob is an empty
    /// list; an unreadable or unparsable blob is logged and treated the
    /// same way.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Vec<Task> {
        if !self.tasks_path.exists() {
            debug!(file = %self.tasks_path.display(), "no saved tasks");
            return Vec::new();
        }

        let raw = match fs::read_to_string(&self.tasks_path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    file = %self.tasks_path.display(),
                    error = %err,
                    "failed reading tasks; starting with an empty list"
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                warn!(
                    file = %self.tasks_path.display(),
                    error = %err,
                    "failed parsing tasks; starting with an empty list"
                );
                Vec::new()
            }
        }
    }

    /// Serializes the full current list and atomically replaces the blob.
    #[tracing::instrument(skip(self, tasks))]
    pub fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        debug!(
            file = %self.tasks_path.display(),
            count = tasks.len(),
            "saving tasks"
        );

        let serialized = serde_json::to_string(tasks)?;
        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;

        temp.persist(&self.tasks_path).map_err(|err| {
            anyhow!(
                "failed to persist {}: {}",
                self.tasks_path.display(),
                err
            )
        })?;

        Ok(())
    }
}
