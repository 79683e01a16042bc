use std::time::Duration;

use chrono::Utc;

use crate::config::Thresholds;
use crate::db::models::{Sample, Session, SleepReport};
use crate::stage::{classify, SleepStage};

use super::recommendations::build_recommendations;
use super::scoring::compute_sleep_score;

/// Compute the report for a completed session.
///
/// Stage durations are estimated as tick count times the sampling interval.
/// Total time covers the whole monitored window (awake time included).
/// An empty sample sequence yields an all-zero report; no ratio here can
/// divide by zero.
pub fn aggregate(
    session: &Session,
    samples: &[Sample],
    thresholds: &Thresholds,
    interval: Duration,
) -> SleepReport {
    let created_at = Utc::now();

    if samples.is_empty() {
        return SleepReport {
            session_id: session.id.clone(),
            total_sleep_time_min: 0.0,
            awake_min: 0.0,
            light_min: 0.0,
            deep_min: 0.0,
            rem_min: 0.0,
            sleep_score: 0,
            sleep_efficiency: 0.0,
            sleep_latency_min: 0.0,
            rem_latency_min: 0.0,
            waso_min: 0.0,
            snoring_events: 0,
            movement_events: 0,
            average_heart_rate: None,
            recommendations: Vec::new(),
            created_at,
        };
    }

    let tick_min = interval.as_secs_f64() / 60.0;
    let stages: Vec<SleepStage> = samples.iter().map(|s| classify(s, thresholds)).collect();

    let count_in = |stage: SleepStage| stages.iter().filter(|s| **s == stage).count();
    let awake_min = count_in(SleepStage::Awake) as f64 * tick_min;
    let light_min = count_in(SleepStage::Light) as f64 * tick_min;
    let deep_min = count_in(SleepStage::Deep) as f64 * tick_min;
    let rem_min = count_in(SleepStage::Rem) as f64 * tick_min;

    let total_sleep_time_min = match session.ended_at {
        Some(_) => session.duration_min(),
        // Open session (crash recovery): fall back to the sampled window.
        None => samples.len() as f64 * tick_min,
    };

    let sleep_efficiency = if total_sleep_time_min > 0.0 {
        ((total_sleep_time_min - awake_min) / total_sleep_time_min).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let minutes_since_start = |sample: &Sample| {
        (sample.timestamp - session.started_at)
            .num_milliseconds()
            .max(0) as f64
            / 60_000.0
    };

    let onset = stages.iter().position(|s| *s != SleepStage::Awake);
    let sleep_latency_min = match onset {
        Some(index) => minutes_since_start(&samples[index]),
        // Never fell asleep: latency spans the whole session.
        None => total_sleep_time_min,
    };

    let rem_latency_min = stages
        .iter()
        .position(|s| *s == SleepStage::Rem)
        .map(|index| minutes_since_start(&samples[index]))
        .unwrap_or(0.0);

    // Wake after sleep onset: awake ticks strictly after the first non-awake
    // sample.
    let waso_min = match onset {
        Some(index) => {
            stages[index..]
                .iter()
                .filter(|s| **s == SleepStage::Awake)
                .count() as f64
                * tick_min
        }
        None => 0.0,
    };

    let snoring_events = samples
        .iter()
        .filter(|s| s.sound_level > thresholds.sound_db)
        .count() as u32;
    let movement_events = samples
        .iter()
        .filter(|s| s.movement_level > thresholds.movement)
        .count() as u32;

    let sleep_score = compute_sleep_score(
        total_sleep_time_min,
        deep_min,
        sleep_efficiency,
        snoring_events + movement_events,
    );

    let mut report = SleepReport {
        session_id: session.id.clone(),
        total_sleep_time_min,
        awake_min,
        light_min,
        deep_min,
        rem_min,
        sleep_score,
        sleep_efficiency,
        sleep_latency_min,
        rem_latency_min,
        waso_min,
        snoring_events,
        movement_events,
        average_heart_rate: None,
        recommendations: Vec::new(),
        created_at,
    };
    report.recommendations = build_recommendations(&report);
    report
}
