use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::SleepStage;

/// Aggregated statistics for one completed session. Created once when the
/// session ends, 1:1 with its session, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SleepReport {
    pub session_id: String,
    /// Total monitored time in minutes.
    pub total_sleep_time_min: f64,
    /// Estimated minutes per stage: tick count times the sampling interval.
    /// Fractional because one 5 s tick is a twelfth of a minute.
    pub awake_min: f64,
    pub light_min: f64,
    pub deep_min: f64,
    pub rem_min: f64,
    /// Composite quality score, 0-100.
    pub sleep_score: u8,
    /// Fraction of monitored time spent asleep, 0-1.
    pub sleep_efficiency: f64,
    /// Minutes from session start to the first non-awake sample.
    pub sleep_latency_min: f64,
    /// Minutes from session start to the first REM sample; 0 if none occurred.
    pub rem_latency_min: f64,
    /// Minutes awake after sleep onset.
    pub waso_min: f64,
    pub snoring_events: u32,
    pub movement_events: u32,
    /// Carried from the original schema for hosts with a heart-rate source;
    /// always `None` here, the core samples no HR sensor.
    pub average_heart_rate: Option<f32>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl SleepReport {
    pub fn minutes_in(&self, stage: SleepStage) -> f64 {
        match stage {
            SleepStage::Awake => self.awake_min,
            SleepStage::Light => self.light_min,
            SleepStage::Deep => self.deep_min,
            SleepStage::Rem => self.rem_min,
        }
    }

    /// Percentage of monitored time in a stage, 0-100. Zero-duration sessions
    /// report 0 for every stage.
    pub fn stage_percentage(&self, stage: SleepStage) -> f64 {
        if self.total_sleep_time_min <= 0.0 {
            return 0.0;
        }
        self.minutes_in(stage) * 100.0 / self.total_sleep_time_min
    }
}
