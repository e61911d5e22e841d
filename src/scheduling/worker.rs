use async_trait::async_trait;

use crate::definition::ReminderDefinition;

/// Handles one firing of a definition's timer.
#[async_trait]
pub trait AlarmWorker {
    async fn handle_alarm(&self, definition: &ReminderDefinition) -> anyhow::Result<()>;
}

pub trait WorkerFactory {
    type Worker: AlarmWorker;

    fn create_worker(&self) -> Self::Worker;
}
