use serde::Serialize;

use crate::db::models::Sample;
use crate::stage::SleepStage;

/// Externally observable monitoring state, published through a `watch`
/// channel: the sampling loop is the single writer, any number of observers
/// (UI, host shell) read without locking.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub is_monitoring: bool,
    pub session_id: Option<String>,
    pub current_stage: SleepStage,
    pub last_sample: Option<Sample>,
    /// Running disruption counts for the active session.
    pub snoring_events: u32,
    pub movement_events: u32,
}
