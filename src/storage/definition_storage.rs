use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::definition::ReminderDefinition;

/// Durable home of the definition list. Reads and writes are always
/// whole-list; there is no incremental mutation.
#[async_trait]
pub trait DefinitionStorage: Send + Sync {
    async fn load(&self) -> anyhow::Result<Vec<ReminderDefinition>>;
    async fn replace(&self, definitions: &[ReminderDefinition]) -> anyhow::Result<()>;
}

/// JSON file storage. A missing file reads as the empty list.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DefinitionStorage for JsonFileStorage {
    async fn load(&self) -> anyhow::Result<Vec<ReminderDefinition>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        Ok(serde_json::from_str(&contents)?)
    }

    async fn replace(&self, definitions: &[ReminderDefinition]) -> anyhow::Result<()> {
        let serialized = serde_json::to_string_pretty(definitions)?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

pub struct InMemoryDefinitionStorage {
    store: RwLock<Vec<ReminderDefinition>>,
}

impl InMemoryDefinitionStorage {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryDefinitionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DefinitionStorage for InMemoryDefinitionStorage {
    async fn load(&self) -> anyhow::Result<Vec<ReminderDefinition>> {
        Ok(self.store.read().await.clone())
    }

    async fn replace(&self, definitions: &[ReminderDefinition]) -> anyhow::Result<()> {
        *self.store.write().await = definitions.to_vec();
        Ok(())
    }
}
