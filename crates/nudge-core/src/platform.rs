use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, anyhow};
use chrono::{Duration, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::notify::{
    ChannelSpec, HandlerPolicy, NotificationPayload, NotificationPlatform, ScheduledNotification,
};

const REGISTRY_FILE: &str = "notifications.data";

#[derive(Debug, Default)]
struct MemoryState {
    handler: Option<HandlerPolicy>,
    channels: Vec<ChannelSpec>,
    scheduled: Vec<ScheduledNotification>,
    permission_requests: u32,
}

/// In-process stand-in for the host scheduler. Tests observe what the
/// adapter did through [`MemoryPlatform::handle`], which stays valid after
/// the platform has been boxed away behind the trait.
#[derive(Debug, Clone)]
pub struct MemoryPlatform {
    grant: bool,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPlatform {
    pub fn granted() -> Self {
        Self {
            grant: true,
            state: Arc::default(),
        }
    }

    /// A platform whose user has declined notification permission.
    pub fn denied() -> Self {
        Self {
            grant: false,
            state: Arc::default(),
        }
    }

    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("notification state poisoned"))
    }
}

/// Read-only view into a [`MemoryPlatform`].
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryHandle {
    pub fn scheduled(&self) -> Vec<ScheduledNotification> {
        self.state
            .lock()
            .map(|state| state.scheduled.clone())
            .unwrap_or_default()
    }

    pub fn scheduled_for(&self, task_id: &str) -> Vec<ScheduledNotification> {
        self.scheduled()
            .into_iter()
            .filter(|notification| notification.payload.task_id == task_id)
            .collect()
    }

    pub fn handler(&self) -> Option<HandlerPolicy> {
        self.state.lock().ok().and_then(|state| state.handler)
    }

    pub fn channels(&self) -> Vec<ChannelSpec> {
        self.state
            .lock()
            .map(|state| state.channels.clone())
            .unwrap_or_default()
    }

    pub fn permission_requests(&self) -> u32 {
        self.state
            .lock()
            .map(|state| state.permission_requests)
            .unwrap_or(0)
    }
}

impl NotificationPlatform for MemoryPlatform {
    fn configure_handler(&self, policy: &HandlerPolicy) -> anyhow::Result<()> {
        self.lock()?.handler = Some(*policy);
        Ok(())
    }

    fn ensure_channel(&self, spec: &ChannelSpec) -> anyhow::Result<()> {
        let mut state = self.lock()?;
        if !state.channels.iter().any(|channel| channel.name == spec.name) {
            state.channels.push(spec.clone());
        }
        Ok(())
    }

    fn request_permission(&self) -> anyhow::Result<bool> {
        self.lock()?.permission_requests += 1;
        Ok(self.grant)
    }

    fn schedule_at(
        &self,
        delay_seconds: i64,
        payload: NotificationPayload,
    ) -> anyhow::Result<String> {
        let identifier = Uuid::new_v4().to_string();
        let entry = ScheduledNotification {
            identifier: identifier.clone(),
            fire_at: Utc::now() + Duration::seconds(delay_seconds),
            payload,
        };
        self.lock()?.scheduled.push(entry);
        Ok(identifier)
    }

    fn list_scheduled(&self) -> anyhow::Result<Vec<ScheduledNotification>> {
        Ok(self.lock()?.scheduled.clone())
    }

    fn cancel(&self, identifier: &str) -> anyhow::Result<()> {
        self.lock()?
            .scheduled
            .retain(|notification| notification.identifier != identifier);
        Ok(())
    }
}

/// File-backed registry standing in for the host scheduler: pending alerts
/// survive process restarts in `notifications.data`, one JSON object per
/// line. Permission is always granted here; delivery itself belongs to the
/// host, not to this crate.
#[derive(Debug)]
pub struct FileRegistry {
    registry_path: PathBuf,
}

impl FileRegistry {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let registry_path = data_dir.join(REGISTRY_FILE);
        if !registry_path.exists() {
            fs::write(&registry_path, "")?;
        }

        info!(registry = %registry_path.display(), "opened notification registry");

        Ok(Self { registry_path })
    }

    fn load(&self) -> anyhow::Result<Vec<ScheduledNotification>> {
        let file = fs::File::open(&self.registry_path)?;
        let reader = BufReader::new(file);

        let mut out = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let entry: ScheduledNotification =
                serde_json::from_str(trimmed).with_context(|| {
                    format!(
                        "failed parsing {} line {}",
                        self.registry_path.display(),
                        idx + 1
                    )
                })?;
            out.push(entry);
        }

        Ok(out)
    }

    fn save(&self, entries: &[ScheduledNotification]) -> anyhow::Result<()> {
        let dir = self
            .registry_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        for entry in entries {
            let serialized = serde_json::to_string(entry)?;
            writeln!(temp, "{serialized}")?;
        }
        temp.flush()?;

        temp.persist(&self.registry_path).map_err(|err| {
            anyhow!(
                "failed to persist {}: {}",
                self.registry_path.display(),
                err
            )
        })?;

        Ok(())
    }
}

impl NotificationPlatform for FileRegistry {
    fn configure_handler(&self, policy: &HandlerPolicy) -> anyhow::Result<()> {
        debug!(?policy, "handler policy recorded");
        Ok(())
    }

    fn ensure_channel(&self, spec: &ChannelSpec) -> anyhow::Result<()> {
        debug!(channel = %spec.name, "no channels on this host; skipping registration");
        Ok(())
    }

    fn request_permission(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn schedule_at(
        &self,
        delay_seconds: i64,
        payload: NotificationPayload,
    ) -> anyhow::Result<String> {
        let mut entries = self.load()?;
        let identifier = Uuid::new_v4().to_string();
        entries.push(ScheduledNotification {
            identifier: identifier.clone(),
            fire_at: Utc::now() + Duration::seconds(delay_seconds),
            payload,
        });
        self.save(&entries)?;

        debug!(identifier = %identifier, count = entries.len(), "registered notification");
        Ok(identifier)
    }

    fn list_scheduled(&self) -> anyhow::Result<Vec<ScheduledNotification>> {
        self.load()
    }

    fn cancel(&self, identifier: &str) -> anyhow::Result<()> {
        let mut entries = self.load()?;
        entries.retain(|entry| entry.identifier != identifier);
        self.save(&entries)?;
        Ok(())
    }
}
