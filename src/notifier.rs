use std::sync::Arc;

use async_trait::async_trait;
use notify_rust::{Notification, Timeout, Urgency};
use tokio::task;

use crate::{
    definition::ReminderDefinition,
    scheduling::{AlarmWorker, WorkerFactory},
};

/// Where fired reminders become user-visible alerts.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn show(&self, definition: &ReminderDefinition) -> anyhow::Result<()>;
}

/// Desktop notifications through the platform notification server. The
/// alert stays on screen until the user interacts with it; dismissal is
/// owned by the server, not by us.
pub struct DesktopNotificationChannel;

impl DesktopNotificationChannel {
    pub fn new() -> Self {
        Self::log_capabilities();
        Self
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn log_capabilities() {
        match notify_rust::get_capabilities() {
            Ok(capabilities) => log::info!(
                "Notification server capabilities: {}",
                capabilities.join(", ")
            ),
            Err(error) => log::warn!("Could not query notification server capabilities: {error}"),
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn log_capabilities() {}
}

impl Default for DesktopNotificationChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationChannel for DesktopNotificationChannel {
    async fn show(&self, definition: &ReminderDefinition) -> anyhow::Result<()> {
        let text = definition.text.clone();
        let sound = definition.sound;

        // notify-rust talks to the server synchronously.
        task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut notification = Notification::new();
            notification
                .summary("Reminder")
                .body(&text)
                .appname("nudged")
                .icon("alarm-clock")
                .urgency(Urgency::Critical)
                .timeout(Timeout::Never);
            if sound {
                notification.sound_name("alarm-clock-elapsed");
            }
            notification.show()?;
            Ok(())
        })
        .await??;

        Ok(())
    }
}

pub struct NotifierWorker {
    channel: Arc<dyn NotificationChannel>,
}

#[async_trait]
impl AlarmWorker for NotifierWorker {
    async fn handle_alarm(&self, definition: &ReminderDefinition) -> anyhow::Result<()> {
        self.channel.show(definition).await
    }
}

pub struct NotifierWorkerFactory {
    channel: Arc<dyn NotificationChannel>,
}

impl NotifierWorkerFactory {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }
}

impl WorkerFactory for NotifierWorkerFactory {
    type Worker = NotifierWorker;

    fn create_worker(&self) -> Self::Worker {
        NotifierWorker {
            channel: Arc::clone(&self.channel),
        }
    }
}
