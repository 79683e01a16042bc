use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::db::models::Sample;

/// Classified sleep state for one sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SleepStage {
    Awake,
    Light,
    Deep,
    Rem,
}

impl SleepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Awake => "Awake",
            SleepStage::Light => "Light",
            SleepStage::Deep => "Deep",
            SleepStage::Rem => "Rem",
        }
    }
}

impl Default for SleepStage {
    fn default() -> Self {
        SleepStage::Awake
    }
}

/// Classify one sample against the current thresholds.
///
/// Priority-ordered decision list, first match wins:
/// 1. movement above threshold -> Awake
/// 2. sound above threshold -> Rem (loud vocalization/snoring is treated as a
///    REM marker in this heuristic; tune via `Thresholds` if it misfires)
/// 3. light above threshold -> Light
/// 4. otherwise -> Deep
pub fn classify(sample: &Sample, thresholds: &Thresholds) -> SleepStage {
    if sample.movement_level > thresholds.movement {
        SleepStage::Awake
    } else if sample.sound_level > thresholds.sound_db {
        SleepStage::Rem
    } else if sample.light_level > thresholds.light_lux {
        SleepStage::Light
    } else {
        SleepStage::Deep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(sound: f32, movement: f32, light: f32) -> Sample {
        Sample {
            id: None,
            session_id: "s1".to_string(),
            timestamp: Utc::now(),
            sound_level: sound,
            movement_level: movement,
            light_level: light,
        }
    }

    #[test]
    fn quiet_dark_still_is_deep() {
        let thresholds = Thresholds::default();
        assert_eq!(
            classify(&sample(10.0, 0.1, 1.0), &thresholds),
            SleepStage::Deep
        );
    }

    #[test]
    fn movement_above_threshold_is_awake() {
        let thresholds = Thresholds::default();
        assert_eq!(
            classify(&sample(10.0, 3.0, 1.0), &thresholds),
            SleepStage::Awake
        );
    }

    #[test]
    fn loud_sound_is_rem() {
        let thresholds = Thresholds::default();
        assert_eq!(
            classify(&sample(70.0, 0.1, 1.0), &thresholds),
            SleepStage::Rem
        );
    }

    #[test]
    fn bright_room_is_light() {
        let thresholds = Thresholds::default();
        assert_eq!(
            classify(&sample(10.0, 0.1, 10.0), &thresholds),
            SleepStage::Light
        );
    }

    #[test]
    fn movement_wins_over_sound_and_light() {
        // Priority ordering: a moving sleeper is awake even if the room is
        // also loud and bright.
        let thresholds = Thresholds::default();
        assert_eq!(
            classify(&sample(80.0, 5.0, 50.0), &thresholds),
            SleepStage::Awake
        );
    }

    #[test]
    fn sound_wins_over_light() {
        let thresholds = Thresholds::default();
        assert_eq!(
            classify(&sample(80.0, 0.1, 50.0), &thresholds),
            SleepStage::Rem
        );
    }

    #[test]
    fn boundary_values_are_not_above_threshold() {
        // Exactly at a threshold does not trip that rule.
        let thresholds = Thresholds {
            sound_db: 60.0,
            movement: 2.5,
            light_lux: 5.0,
        };
        assert_eq!(
            classify(&sample(60.0, 2.5, 5.0), &thresholds),
            SleepStage::Deep
        );
        assert_eq!(
            classify(&sample(60.0, 2.5001, 5.0), &thresholds),
            SleepStage::Awake
        );
        assert_eq!(
            classify(&sample(60.0001, 2.5, 5.0), &thresholds),
            SleepStage::Rem
        );
        assert_eq!(
            classify(&sample(60.0, 2.5, 5.0001), &thresholds),
            SleepStage::Light
        );
        assert_eq!(
            classify(&sample(59.9999, 2.4999, 4.9999), &thresholds),
            SleepStage::Deep
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let thresholds = Thresholds::default();
        let s = sample(61.0, 0.3, 2.0);
        let first = classify(&s, &thresholds);
        for _ in 0..100 {
            assert_eq!(classify(&s, &thresholds), first);
        }
    }
}
