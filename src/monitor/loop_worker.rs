use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigSource;
use crate::db::models::Sample;
use crate::error::MonitorError;
use crate::sensors::{SensorSet, WakeGuard};

use super::session_manager::SessionManager;
use super::state::MonitorSnapshot;

// Set to false to silence per-tick logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Periodic collection cycle for one session. Owns the sensor set and the
/// wake guard for the session's duration; both are released on every exit
/// path. Cancellation takes effect within one tick.
pub(super) async fn sampling_loop(
    session_id: String,
    manager: Arc<Mutex<SessionManager>>,
    config: Arc<dyn ConfigSource>,
    mut sensors: SensorSet,
    mut wake: WakeGuard,
    snapshot_tx: watch::Sender<MonitorSnapshot>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let timestamp = Utc::now();
                match collect_tick(
                    &session_id,
                    timestamp,
                    &manager,
                    config.as_ref(),
                    &mut sensors,
                    &snapshot_tx,
                )
                .await
                {
                    Ok(()) => {}
                    Err(err) if err.downcast_ref::<MonitorError>().is_some() => {
                        // The session ended or was replaced underneath us;
                        // this loop is outdated and must wind down.
                        log_warn!("sampling loop for session {session_id} is stale: {err}");
                        break;
                    }
                    Err(err) => {
                        log_error!("sample collection failed for session {session_id}: {err:?}");
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop for session {session_id} shutting down");
                break;
            }
        }
    }

    sensors.stop_all();
    wake.release();
}

async fn collect_tick(
    session_id: &str,
    timestamp: DateTime<Utc>,
    manager: &Mutex<SessionManager>,
    config: &dyn ConfigSource,
    sensors: &mut SensorSet,
    snapshot_tx: &watch::Sender<MonitorSnapshot>,
) -> Result<()> {
    let readings = sensors.read();
    let sample = Sample {
        id: None,
        session_id: session_id.to_string(),
        timestamp,
        sound_level: readings.sound_db,
        movement_level: readings.movement,
        light_level: readings.light_lux,
    };

    // Thresholds are read fresh every tick so configuration edits apply
    // mid-session.
    let thresholds = config.current_thresholds();
    let outcome = manager
        .lock()
        .await
        .append_sample(sample.clone(), &thresholds)
        .await?;

    log_info!(
        "sample for session {session_id}: {:.1} dB, {:.2} m/s², {:.1} lux -> {:?}",
        sample.sound_level,
        sample.movement_level,
        sample.light_level,
        outcome.stage
    );

    snapshot_tx.send_replace(MonitorSnapshot {
        is_monitoring: true,
        session_id: Some(session_id.to_string()),
        current_stage: outcome.stage,
        last_sample: Some(sample),
        snoring_events: outcome.snoring_events,
        movement_events: outcome.movement_events,
    });

    Ok(())
}
