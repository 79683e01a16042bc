use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One continuous monitoring interval from start to end.
///
/// Invariants: at most one session is active at a time, and `ended_at` is set
/// exactly when `is_active` is false. Only the session manager mutates a
/// session; once ended it is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Sleep quality 0-100, written when the session ends.
    pub quality_score: u8,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn begin(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: now,
            ended_at: None,
            is_active: true,
            quality_score: 0,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Monitored duration in minutes. Zero while the session is still open.
    pub fn duration_min(&self) -> f64 {
        match self.ended_at {
            Some(ended_at) => {
                let secs = (ended_at - self.started_at).num_seconds().max(0);
                secs as f64 / 60.0
            }
            None => 0.0,
        }
    }
}
