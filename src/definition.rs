use chrono::Utc;
use serde::{Deserialize, Serialize};

pub type DefinitionId = String;

/// Jitter may never exceed this fraction of the interval.
pub const JITTER_RATIO_LIMIT: f64 = 0.9;

/// A stored reminder record. Immutable value; edits replace the whole
/// record by id match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderDefinition {
    pub id: DefinitionId,
    pub text: String,
    /// Nominal period between firings, in minutes.
    pub interval: f64,
    /// ± randomization band in minutes, clamped at save time.
    #[serde(default)]
    pub jitter: f64,
    #[serde(default)]
    pub sound: bool,
    pub active: bool,
}

pub fn clamp_jitter(interval: f64, jitter: f64) -> f64 {
    jitter.min(interval * JITTER_RATIO_LIMIT)
}

/// Timestamp-derived id for definitions created without one.
pub fn generate_id() -> DefinitionId {
    Utc::now().timestamp_millis().to_string()
}
