use std::sync::Arc;

use nudged::{
    appsettings,
    notifier::{DesktopNotificationChannel, NotifierWorkerFactory},
    scheduling::AlarmManager,
    storage::{DefinitionStorage, DefinitionStore, EventLog, JsonFileStorage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = appsettings::get();
    let storage: Arc<dyn DefinitionStorage> =
        Arc::new(JsonFileStorage::new(&settings.storage.definitions_path));
    let event_log = Arc::new(EventLog::open(&settings.storage.local_state_path).await);

    let store = DefinitionStore::new(Arc::clone(&storage));
    if let Err(error) = store.seed_examples(&event_log).await {
        log::warn!("Could not seed example definitions: {error}");
    }

    let channel = Arc::new(DesktopNotificationChannel::new());
    let factory = NotifierWorkerFactory::new(channel);
    let manager = AlarmManager::create(factory, storage, Arc::clone(&event_log));
    let handle = manager.handle();

    // Timers do not survive a process restart; heal the armed set instead of
    // rebuilding it so any timers that did survive keep their phase.
    event_log.append("Service started").await;
    handle.reconcile().await?;

    tokio::signal::ctrl_c().await?;
    event_log.append("Service shutting down").await;
    Ok(())
}
