use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tick's combined sensor reading. Immutable once created; belongs to
/// exactly one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Database row id, `None` until persisted.
    pub id: Option<i64>,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// Ambient sound in dB, 0-90.
    pub sound_level: f32,
    /// Linear acceleration magnitude in m/s².
    pub movement_level: f32,
    /// Ambient light in lux.
    pub light_level: f32,
}
