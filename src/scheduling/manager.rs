use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    definition::{DefinitionId, ReminderDefinition},
    storage::{DefinitionStorage, EventLog},
};

use super::{
    common::{AlarmManagerMessage, AlarmManagerSender},
    delay,
    scheduler::{AlarmScheduler, ScheduledTask},
    worker::{AlarmWorker, WorkerFactory},
};

const CANCEL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Owns the armed timer set and reacts to refresh signals, startup
/// reconciliation and timer firings. All state lives inside the message
/// loop; timer identity (by definition id) is the only key shared with the
/// store.
pub struct AlarmManager<TFactory: WorkerFactory> {
    sender: AlarmManagerSender,
    manager_task_handle: JoinHandle<()>,
    _marker: PhantomData<TFactory>,
}

impl<TFactory> AlarmManager<TFactory>
where
    TFactory: WorkerFactory + Send + Sync + 'static,
    TFactory::Worker: AlarmWorker + Send + Sync,
{
    pub fn create(
        worker_factory: TFactory,
        storage: Arc<dyn DefinitionStorage>,
        event_log: Arc<EventLog>,
    ) -> Self {
        let (channel_sender, receiver) = mpsc::channel(64);
        let sender = AlarmManagerSender::new(channel_sender);
        let loop_sender = sender.clone();
        let manager_task_handle = tokio::spawn(async move {
            Self::handle_messages(worker_factory, storage, event_log, receiver, loop_sender).await;
        });

        Self {
            sender,
            manager_task_handle,
            _marker: PhantomData,
        }
    }

    pub fn handle(&self) -> AlarmManagerSender {
        self.sender.clone()
    }

    async fn handle_messages(
        worker_factory: TFactory,
        storage: Arc<dyn DefinitionStorage>,
        event_log: Arc<EventLog>,
        mut receiver: mpsc::Receiver<AlarmManagerMessage>,
        sender: AlarmManagerSender,
    ) {
        let mut armed = HashMap::<DefinitionId, ScheduledTask>::new();
        while let Some(msg) = receiver.recv().await {
            log::debug!("manager received message. [msg = {msg:?}]");
            match msg {
                AlarmManagerMessage::Refresh { ack } => {
                    let ok = Self::rebuild_all(&mut armed, &storage, &event_log, &sender).await;
                    let _ = ack.send(ok);
                }
                AlarmManagerMessage::Reconcile { ack } => {
                    let ok = Self::restore_missing(&mut armed, &storage, &event_log, &sender).await;
                    let _ = ack.send(ok);
                }
                AlarmManagerMessage::Fired(id) => {
                    Self::handle_fired(
                        &mut armed,
                        &worker_factory,
                        &storage,
                        &event_log,
                        &sender,
                        id,
                    )
                    .await;
                }
                AlarmManagerMessage::ListArmed(reply) => {
                    let _ = reply.send(armed.keys().cloned().collect());
                }
            }
        }
    }

    /// Full rebuild on a user-driven change: every timer is cleared
    /// unconditionally, then one is armed per active definition. Re-running
    /// produces an equivalent timer set.
    async fn rebuild_all(
        armed: &mut HashMap<DefinitionId, ScheduledTask>,
        storage: &Arc<dyn DefinitionStorage>,
        event_log: &EventLog,
        sender: &AlarmManagerSender,
    ) -> bool {
        event_log.append("Updating alarms").await;
        for (_, task) in armed.drain() {
            task.cancel(CANCEL_TIMEOUT).await;
        }

        let definitions = match storage.load().await {
            Ok(definitions) => definitions,
            Err(error) => {
                event_log
                    .append(format!("Error reading definitions: {error}"))
                    .await;
                return false;
            }
        };
        event_log
            .append(format!("Found {} definition(s)", definitions.len()))
            .await;

        for definition in definitions.into_iter().filter(|d| d.active) {
            Self::arm_definition(armed, event_log, sender.clone(), definition).await;
        }
        true
    }

    /// Startup healing: arm only active definitions with no surviving timer.
    /// Timers that outlived a process suspension are left untouched.
    async fn restore_missing(
        armed: &mut HashMap<DefinitionId, ScheduledTask>,
        storage: &Arc<dyn DefinitionStorage>,
        event_log: &EventLog,
        sender: &AlarmManagerSender,
    ) -> bool {
        let definitions = match storage.load().await {
            Ok(definitions) => definitions,
            Err(error) => {
                event_log
                    .append(format!("Error reading definitions: {error}"))
                    .await;
                return false;
            }
        };

        let missing: Vec<ReminderDefinition> = definitions
            .into_iter()
            .filter(|d| d.active && !armed.contains_key(&d.id))
            .collect();
        if missing.is_empty() {
            return true;
        }

        event_log
            .append(format!("Restoring {} missing alarm(s)", missing.len()))
            .await;
        for definition in missing {
            Self::arm_definition(armed, event_log, sender.clone(), definition).await;
        }
        true
    }

    /// A timer elapsed. The definition is looked up fresh from storage: if it
    /// was deleted or deactivated in the meantime the alarm expires silently,
    /// otherwise the notification is shown and the same id is re-armed with a
    /// new random draw.
    async fn handle_fired(
        armed: &mut HashMap<DefinitionId, ScheduledTask>,
        worker_factory: &TFactory,
        storage: &Arc<dyn DefinitionStorage>,
        event_log: &EventLog,
        sender: &AlarmManagerSender,
        id: DefinitionId,
    ) {
        event_log.append(format!("Alarm triggered: {id}")).await;
        armed.remove(&id);

        let definitions = match storage.load().await {
            Ok(definitions) => definitions,
            Err(error) => {
                event_log
                    .append(format!("Error reading definitions: {error}"))
                    .await;
                return;
            }
        };
        let Some(definition) = definitions.into_iter().find(|d| d.id == id && d.active) else {
            event_log
                .append(format!(
                    "No matching active definition found for alarm: {id}"
                ))
                .await;
            return;
        };

        event_log
            .append(format!("Showing notification: \"{}\"", definition.text))
            .await;
        let worker = worker_factory.create_worker();
        if let Err(error) = worker.handle_alarm(&definition).await {
            event_log
                .append(format!("Error showing notification for {id}: {error}"))
                .await;
        }

        Self::arm_definition(armed, event_log, sender.clone(), definition).await;
    }

    async fn arm_definition(
        armed: &mut HashMap<DefinitionId, ScheduledTask>,
        event_log: &EventLog,
        sender: AlarmManagerSender,
        definition: ReminderDefinition,
    ) {
        let delay = {
            let mut rng = rand::thread_rng();
            delay::randomized_delay_minutes(definition.interval, definition.jitter, &mut rng)
        };
        event_log
            .append(format!(
                "Scheduling next alarm for \"{}\" in {:.2} minutes (base: {}, jitter: \u{b1}{})",
                definition.text, delay, definition.interval, definition.jitter
            ))
            .await;

        let task = AlarmScheduler::arm(definition.id.clone(), delay, sender);
        armed.insert(definition.id, task);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::{
        definition::{DefinitionId, ReminderDefinition},
        scheduling::{AlarmManager, AlarmManagerSender, AlarmWorker, WorkerFactory},
        storage::{DefinitionStorage, EventLog, InMemoryDefinitionStorage},
    };

    struct RecordingWorkerFactory {
        shown: Arc<Mutex<Vec<DefinitionId>>>,
    }

    struct RecordingWorker {
        shown: Arc<Mutex<Vec<DefinitionId>>>,
    }

    #[async_trait]
    impl AlarmWorker for RecordingWorker {
        async fn handle_alarm(&self, definition: &ReminderDefinition) -> anyhow::Result<()> {
            self.shown.lock().await.push(definition.id.clone());
            Ok(())
        }
    }

    impl WorkerFactory for RecordingWorkerFactory {
        type Worker = RecordingWorker;

        fn create_worker(&self) -> Self::Worker {
            RecordingWorker {
                shown: Arc::clone(&self.shown),
            }
        }
    }

    fn definition(id: &str, interval: f64, active: bool) -> ReminderDefinition {
        ReminderDefinition {
            id: id.to_string(),
            text: format!("reminder {id}"),
            interval,
            jitter: 0.0,
            sound: false,
            active,
        }
    }

    async fn start_manager(
        definitions: &[ReminderDefinition],
    ) -> (
        AlarmManagerSender,
        Arc<InMemoryDefinitionStorage>,
        Arc<Mutex<Vec<DefinitionId>>>,
    ) {
        let storage = Arc::new(InMemoryDefinitionStorage::new());
        storage.replace(definitions).await.unwrap();

        let shown = Arc::new(Mutex::new(Vec::new()));
        let factory = RecordingWorkerFactory {
            shown: Arc::clone(&shown),
        };
        let manager = AlarmManager::create(
            factory,
            Arc::clone(&storage) as Arc<dyn DefinitionStorage>,
            Arc::new(EventLog::ephemeral()),
        );

        (manager.handle(), storage, shown)
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_arms_one_timer_per_active_definition() {
        let (handle, _storage, _shown) = start_manager(&[
            definition("a", 30.0, true),
            definition("b", 45.0, true),
            definition("c", 20.0, false),
        ])
        .await;

        assert!(handle.refresh().await.unwrap());

        let mut armed = handle.armed_ids().await.unwrap();
        armed.sort();
        assert_eq!(armed, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_refresh_produces_an_equivalent_timer_set() {
        let (handle, _storage, _shown) =
            start_manager(&[definition("a", 30.0, true), definition("b", 45.0, true)]).await;

        assert!(handle.refresh().await.unwrap());
        assert!(handle.refresh().await.unwrap());

        let mut armed = handle.armed_ids().await.unwrap();
        armed.sort();
        assert_eq!(armed, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn firing_shows_the_notification_and_rearms() {
        // Zero jitter makes the delay exactly the interval.
        let (handle, _storage, shown) = start_manager(&[definition("a", 10.0, true)]).await;
        handle.refresh().await.unwrap();

        tokio::time::sleep(Duration::from_secs(601)).await;

        assert_eq!(*shown.lock().await, vec!["a".to_string()]);
        assert_eq!(handle.armed_ids().await.unwrap(), vec!["a".to_string()]);

        // The re-armed timer keeps firing.
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(shown.lock().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn firing_a_deleted_definition_is_silent_and_terminal() {
        let (handle, storage, shown) = start_manager(&[definition("a", 1.0, true)]).await;
        handle.refresh().await.unwrap();

        // Deleted behind the scheduler's back; no refresh signal.
        storage.replace(&[]).await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(shown.lock().await.is_empty());
        assert!(handle.armed_ids().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn firing_a_deactivated_definition_is_silent_and_terminal() {
        let (handle, storage, shown) = start_manager(&[definition("a", 1.0, true)]).await;
        handle.refresh().await.unwrap();

        storage.replace(&[definition("a", 1.0, false)]).await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(shown.lock().await.is_empty());
        assert!(handle.armed_ids().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reconcile_arms_only_the_missing_timers() {
        let (handle, storage, shown) = start_manager(&[definition("a", 10.0, true)]).await;
        handle.refresh().await.unwrap();

        // Five minutes into a's ten-minute countdown, b appears.
        tokio::time::sleep(Duration::from_secs(300)).await;
        storage
            .replace(&[definition("a", 10.0, true), definition("b", 10.0, true)])
            .await
            .unwrap();
        assert!(handle.reconcile().await.unwrap());

        let mut armed = handle.armed_ids().await.unwrap();
        armed.sort();
        assert_eq!(armed, vec!["a".to_string(), "b".to_string()]);

        // a's original countdown survived: it fires at t=600, not t=900.
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(*shown.lock().await, vec!["a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn reconcile_with_nothing_missing_changes_nothing() {
        let (handle, _storage, _shown) = start_manager(&[definition("a", 10.0, true)]).await;
        handle.refresh().await.unwrap();

        assert!(handle.reconcile().await.unwrap());

        assert_eq!(handle.armed_ids().await.unwrap(), vec!["a".to_string()]);
    }
}
