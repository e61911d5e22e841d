use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Only the most recent entries are kept.
const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalState {
    #[serde(default)]
    logs: Vec<String>,
    #[serde(default)]
    seeded: bool,
}

/// Rolling log of timestamped lines plus the one-time seeding flag, held
/// together in local state. Every write persists log-and-continue; a failed
/// write never surfaces past a warning.
pub struct EventLog {
    path: Option<PathBuf>,
    state: Mutex<LocalState>,
}

impl EventLog {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|error| {
                log::warn!("Could not parse local state, starting fresh: {error}");
                LocalState::default()
            }),
            Err(_) => LocalState::default(),
        };

        Self {
            path: Some(path),
            state: Mutex::new(state),
        }
    }

    /// In-memory log with no backing file, for tests.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            state: Mutex::new(LocalState::default()),
        }
    }

    pub async fn append(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::info!("{message}");

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut state = self.state.lock().await;
        state.logs.push(format!("{timestamp}: {message}"));
        if state.logs.len() > MAX_LOG_ENTRIES {
            let excess = state.logs.len() - MAX_LOG_ENTRIES;
            state.logs.drain(..excess);
        }
        self.persist(&state).await;
    }

    pub async fn entries(&self) -> Vec<String> {
        self.state.lock().await.logs.clone()
    }

    pub async fn is_seeded(&self) -> bool {
        self.state.lock().await.seeded
    }

    pub async fn mark_seeded(&self) {
        let mut state = self.state.lock().await;
        state.seeded = true;
        self.persist(&state).await;
    }

    async fn persist(&self, state: &LocalState) {
        let Some(path) = &self.path else {
            return;
        };
        let serialized = match serde_json::to_string_pretty(state) {
            Ok(serialized) => serialized,
            Err(error) => {
                log::warn!("Could not serialize local state: {error}");
                return;
            }
        };
        if let Err(error) = tokio::fs::write(path, serialized).await {
            log::warn!("Could not persist local state to {}: {error}", path.display());
        }
    }
}
