use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::definition::DefinitionId;

use super::{common::AlarmManagerSender, delay};

/// One armed timer: a task sleeping a randomized delay, cancellable from the
/// manager. Dropping the handle does not stop the task; `cancel` does.
pub struct ScheduledTask {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTask {
    pub fn new(task_handle: JoinHandle<()>, cancellation_token: CancellationToken) -> Self {
        Self {
            task_handle,
            cancellation_token,
        }
    }

    pub async fn cancel(self, timeout: std::time::Duration) {
        self.cancellation_token.cancel();
        let cancel_with_timeout = time::timeout(timeout, self.task_handle);
        let _ = cancel_with_timeout.await;
    }
}

pub struct AlarmScheduler;

impl AlarmScheduler {
    /// Arms a one-shot timer for `id`. When the delay elapses the manager is
    /// told the alarm fired; recurrence comes from the manager re-arming.
    pub fn arm(id: DefinitionId, delay_minutes: f64, sender: AlarmManagerSender) -> ScheduledTask {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let delay = delay::to_duration(delay_minutes);
        let task_handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_cancellation_token.cancelled() => {
                    log::debug!("Timer task cancelled before firing. [id = {id}]");
                },
                _ = tokio::time::sleep(delay) => {
                    if let Err(error) = sender.notify_fired(id).await {
                        log::warn!("Could not deliver alarm firing to manager: {error}");
                    }
                }
            }
        });

        ScheduledTask::new(task_handle, cancellation_token)
    }
}
