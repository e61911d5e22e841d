use std::sync::Arc;

use crate::definition::{ReminderDefinition, clamp_jitter, generate_id};

use super::{DefinitionStorage, EventLog, model::DefinitionDraft};

/// Handle through which the definition list is mutated. Every operation
/// reads the whole list, applies one change, persists the whole list and
/// returns it. Last writer wins; there is no conflict detection.
pub struct DefinitionStore {
    storage: Arc<dyn DefinitionStorage>,
}

impl DefinitionStore {
    pub fn new(storage: Arc<dyn DefinitionStorage>) -> Self {
        Self { storage }
    }

    pub async fn all(&self) -> anyhow::Result<Vec<ReminderDefinition>> {
        self.storage.load().await
    }

    /// Upsert by id. New definitions get a generated id and start active;
    /// edits keep the stored active flag. Jitter is clamped here and nowhere
    /// else.
    pub async fn save(&self, draft: DefinitionDraft) -> anyhow::Result<Vec<ReminderDefinition>> {
        let mut definitions = self.storage.load().await?;

        let id = draft.id.unwrap_or_else(generate_id);
        let mut definition = ReminderDefinition {
            id: id.clone(),
            text: draft.text,
            interval: draft.interval,
            jitter: clamp_jitter(draft.interval, draft.jitter),
            sound: draft.sound,
            active: true,
        };

        if let Some(existing) = definitions.iter_mut().find(|d| d.id == id) {
            definition.active = existing.active;
            *existing = definition;
        } else {
            definitions.push(definition);
        }

        self.storage.replace(&definitions).await?;
        Ok(definitions)
    }

    pub async fn remove(&self, id: &str) -> anyhow::Result<Vec<ReminderDefinition>> {
        let mut definitions = self.storage.load().await?;
        definitions.retain(|d| d.id != id);
        self.storage.replace(&definitions).await?;
        Ok(definitions)
    }

    pub async fn set_active(
        &self,
        id: &str,
        active: bool,
    ) -> anyhow::Result<Vec<ReminderDefinition>> {
        let mut definitions = self.storage.load().await?;
        let Some(definition) = definitions.iter_mut().find(|d| d.id == id) else {
            anyhow::bail!("No definition with id {id}");
        };
        definition.active = active;
        self.storage.replace(&definitions).await?;
        Ok(definitions)
    }

    /// One-time insertion of example definitions for a fresh install: only
    /// when the list is empty and seeding has never run.
    pub async fn seed_examples(&self, event_log: &EventLog) -> anyhow::Result<()> {
        let definitions = self.storage.load().await?;
        if !definitions.is_empty() || event_log.is_seeded().await {
            return Ok(());
        }

        let seeds = [
            seed("seed-1", "Drink water", 30.0, 5.0, false),
            seed("seed-2", "Stand up and stretch", 45.0, 10.0, true),
            seed("seed-3", "Check posture", 20.0, 0.0, false),
        ];
        self.storage.replace(&seeds).await?;
        event_log.mark_seeded().await;
        event_log.append("Seeded example definitions").await;
        Ok(())
    }
}

fn seed(id: &str, text: &str, interval: f64, jitter: f64, sound: bool) -> ReminderDefinition {
    ReminderDefinition {
        id: id.to_string(),
        text: text.to_string(),
        interval,
        jitter,
        sound,
        active: false,
    }
}
