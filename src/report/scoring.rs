/// Composite sleep-score weights. Policy, not contract: tune freely, but keep
/// the result deterministic.
const WEIGHT_EFFICIENCY: f64 = 0.4;
const WEIGHT_DEEP: f64 = 0.3;
const WEIGHT_DISRUPTION: f64 = 0.2;
const WEIGHT_DURATION: f64 = 0.1;

/// Deep-sleep fraction considered "enough"; at or above this the deep factor
/// saturates at 1.0.
const DEEP_TARGET_FRACTION: f64 = 0.20;

/// Disruptions per hour at which the disruption factor bottoms out at 0.
const DISRUPTIONS_PER_HOUR_FLOOR: f64 = 10.0;

/// Minutes of monitored sleep considered a full night.
const TARGET_DURATION_MIN: f64 = 480.0;

/// Weighted composite score in [0, 100]:
/// 40% sleep efficiency, 30% deep-sleep proportion (saturating at 20% of the
/// night), 20% inverse disruption rate (0 at 10+ events/hour), 10% duration
/// adequacy against an 8 h target. Zero-duration sessions score 0.
pub fn compute_sleep_score(
    total_min: f64,
    deep_min: f64,
    efficiency: f64,
    disruption_events: u32,
) -> u8 {
    if total_min <= 0.0 {
        return 0;
    }

    let efficiency_factor = efficiency.clamp(0.0, 1.0);

    let deep_fraction = (deep_min / total_min).clamp(0.0, 1.0);
    let deep_factor = (deep_fraction / DEEP_TARGET_FRACTION).min(1.0);

    let disruptions_per_hour = f64::from(disruption_events) / (total_min / 60.0);
    let disruption_factor = (1.0 - disruptions_per_hour / DISRUPTIONS_PER_HOUR_FLOOR).clamp(0.0, 1.0);

    let duration_factor = (total_min / TARGET_DURATION_MIN).min(1.0);

    let score = 100.0
        * (WEIGHT_EFFICIENCY * efficiency_factor
            + WEIGHT_DEEP * deep_factor
            + WEIGHT_DISRUPTION * disruption_factor
            + WEIGHT_DURATION * duration_factor);

    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_session_scores_zero() {
        assert_eq!(compute_sleep_score(0.0, 0.0, 0.0, 0), 0);
    }

    #[test]
    fn ideal_night_scores_hundred() {
        // 8h, 25% deep, perfect efficiency, no disruptions.
        assert_eq!(compute_sleep_score(480.0, 120.0, 1.0, 0), 100);
    }

    #[test]
    fn disruptions_lower_the_score() {
        let calm = compute_sleep_score(480.0, 100.0, 0.95, 0);
        let restless = compute_sleep_score(480.0, 100.0, 0.95, 40);
        assert!(restless < calm);
    }

    #[test]
    fn short_naps_lose_duration_credit() {
        let nap = compute_sleep_score(60.0, 15.0, 1.0, 0);
        let night = compute_sleep_score(480.0, 120.0, 1.0, 0);
        assert!(nap < night);
    }

    #[test]
    fn score_is_bounded() {
        for disruptions in [0u32, 5, 50, 500] {
            let score = compute_sleep_score(480.0, 480.0, 2.0, disruptions);
            assert!(score <= 100);
        }
    }
}
