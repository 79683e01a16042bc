use crate::db::models::SleepReport;
use crate::stage::SleepStage;

const LOW_DEEP_SLEEP_PCT: f64 = 10.0;
const LOW_EFFICIENCY: f64 = 0.85;
const HIGH_LATENCY_MIN: f64 = 30.0;
const HIGH_WASO_MIN: f64 = 30.0;
const SHORT_NIGHT_MIN: f64 = 420.0;

/// Rule-matched advice derived from the computed metrics. The order is fixed
/// so reports stay comparable across nights.
pub fn build_recommendations(report: &SleepReport) -> Vec<String> {
    let mut recommendations = Vec::new();

    if report.total_sleep_time_min <= 0.0 {
        return recommendations;
    }

    if report.stage_percentage(SleepStage::Deep) < LOW_DEEP_SLEEP_PCT {
        recommendations.push(
            "Deep sleep was low; keep the bedroom dark and quiet and avoid screens before bed."
                .to_string(),
        );
    }

    if report.sleep_efficiency < LOW_EFFICIENCY {
        recommendations.push(
            "Sleep efficiency was below 85%; consider going to bed only when sleepy.".to_string(),
        );
    }

    if report.sleep_latency_min > HIGH_LATENCY_MIN {
        recommendations.push(
            "It took over 30 minutes to fall asleep; a wind-down routine may help.".to_string(),
        );
    }

    if report.waso_min > HIGH_WASO_MIN {
        recommendations.push(
            "You were awake for long stretches during the night; check for noise or light disturbances."
                .to_string(),
        );
    }

    let events_per_hour =
        f64::from(report.snoring_events) / (report.total_sleep_time_min / 60.0);
    if events_per_hour > 5.0 {
        recommendations
            .push("Frequent loud noise was detected; check for snoring.".to_string());
    }

    let movements_per_hour =
        f64::from(report.movement_events) / (report.total_sleep_time_min / 60.0);
    if movements_per_hour > 5.0 {
        recommendations.push(
            "Restless movement was frequent; a cooler room or firmer mattress may help."
                .to_string(),
        );
    }

    if report.total_sleep_time_min < SHORT_NIGHT_MIN {
        recommendations
            .push("You slept less than 7 hours; aim for a longer night.".to_string());
    }

    recommendations
}
