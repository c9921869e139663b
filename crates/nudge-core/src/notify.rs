use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;

/// What a scheduled alert carries. `task_id` is the lookup key used by
/// [`Notifier::cancel_reminder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub identifier: String,
    pub fire_at: DateTime<Utc>,
    pub payload: NotificationPayload,
}

/// How delivered alerts present themselves. Applied to the platform exactly
/// once, when the [`Notifier`] is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerPolicy {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for HandlerPolicy {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: false,
        }
    }
}

impl HandlerPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            show_alert: cfg.get_bool("notify.alert").unwrap_or(true),
            play_sound: cfg.get_bool("notify.sound").unwrap_or(true),
            set_badge: cfg.get_bool("notify.badge").unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Min,
    Low,
    Default,
    High,
    Max,
}

/// One-time channel registration. Hosts without notification channels may
/// treat this as a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub name: String,
    pub importance: Importance,
    pub vibration_pattern: Vec<u32>,
    pub light_color: String,
}

impl Default for ChannelSpec {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            importance: Importance::Max,
            vibration_pattern: vec![0, 250, 250, 250],
            light_color: "#FF231F7C".to_string(),
        }
    }
}

/// Host notification facility. Implementations live in [`crate::platform`].
pub trait NotificationPlatform: Send + Sync {
    fn configure_handler(&self, policy: &HandlerPolicy) -> anyhow::Result<()>;

    fn ensure_channel(&self, spec: &ChannelSpec) -> anyhow::Result<()>;

    fn request_permission(&self) -> anyhow::Result<bool>;

    /// Registers one alert `delay_seconds` from now and returns its host
    /// identifier.
    fn schedule_at(
        &self,
        delay_seconds: i64,
        payload: NotificationPayload,
    ) -> anyhow::Result<String>;

    fn list_scheduled(&self) -> anyhow::Result<Vec<ScheduledNotification>>;

    fn cancel(&self, identifier: &str) -> anyhow::Result<()>;
}

pub struct Notifier {
    platform: Box<dyn NotificationPlatform>,
    denied_notice_shown: bool,
}

impl Notifier {
    pub fn new(
        platform: Box<dyn NotificationPlatform>,
        policy: HandlerPolicy,
    ) -> anyhow::Result<Self> {
        platform.configure_handler(&policy)?;
        debug!(?policy, "configured notification handler");

        Ok(Self {
            platform,
            denied_notice_shown: false,
        })
    }

    /// Registers the default channel, then queries the grant state. The
    /// state is asked for again on every app start, never cached across
    /// runs; a denial is reported to the user once per process.
    #[instrument(skip(self))]
    pub fn ensure_permission(&mut self) -> anyhow::Result<bool> {
        self.platform.ensure_channel(&ChannelSpec::default())?;

        let granted = self.platform.request_permission()?;
        if !granted {
            warn!("notification permission denied");
            if !self.denied_notice_shown {
                eprintln!(
                    "Notifications are disabled. Enable them in system settings to receive reminders."
                );
                self.denied_notice_shown = true;
            }
        }

        Ok(granted)
    }

    /// Registers one alert for the task. The delay is handed to the host
    /// as-is; callers only schedule future dates.
    #[instrument(skip(self, title, fire_at, now))]
    pub fn schedule_reminder(
        &mut self,
        task_id: &str,
        title: &str,
        fire_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let delay_seconds = (fire_at - now).num_seconds();
        let payload = NotificationPayload {
            title: "Task reminder".to_string(),
            body: title.to_string(),
            task_id: task_id.to_string(),
        };

        let identifier = self.platform.schedule_at(delay_seconds, payload)?;
        info!(identifier = %identifier, delay_seconds, "scheduled reminder");
        Ok(())
    }

    /// Cancels every scheduled alert carrying `task_id`. Linear scan over
    /// everything the host has queued; outstanding alerts are bounded by
    /// the number of tasks with reminders.
    #[instrument(skip(self))]
    pub fn cancel_reminder(&mut self, task_id: &str) -> anyhow::Result<()> {
        let scheduled = self.platform.list_scheduled()?;
        for notification in scheduled {
            if notification.payload.task_id == task_id {
                debug!(identifier = %notification.identifier, "cancelling reminder");
                self.platform.cancel(&notification.identifier)?;
            }
        }
        Ok(())
    }

    pub fn scheduled(&self) -> anyhow::Result<Vec<ScheduledNotification>> {
        self.platform.list_scheduled()
    }
}
