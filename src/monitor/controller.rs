use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigSource;
use crate::db::models::SleepReport;
use crate::db::Database;
use crate::error::MonitorError;
use crate::sensors::{SensorProvider, SensorSet, WakeGuard};

use super::loop_worker::sampling_loop;
use super::session_manager::SessionManager;
use super::state::MonitorSnapshot;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

struct LoopHandle {
    session_id: String,
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Entry point for host shells: start/stop monitoring, observe the live
/// snapshot, recover after a crash. Cheap to clone; all clones drive the same
/// monitoring state.
#[derive(Clone)]
pub struct MonitorController {
    manager: Arc<Mutex<SessionManager>>,
    config: Arc<dyn ConfigSource>,
    sensors: Arc<dyn SensorProvider>,
    sample_interval: Duration,
    worker: Arc<Mutex<Option<LoopHandle>>>,
    snapshot_tx: watch::Sender<MonitorSnapshot>,
}

impl MonitorController {
    pub fn new(db: Database, config: Arc<dyn ConfigSource>, sensors: Arc<dyn SensorProvider>) -> Self {
        let (snapshot_tx, _) = watch::channel(MonitorSnapshot::default());
        Self {
            manager: Arc::new(Mutex::new(SessionManager::new(db))),
            config,
            sensors,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            worker: Arc::new(Mutex::new(None)),
            snapshot_tx,
        }
    }

    /// Override the sampling cadence (the default is 5 seconds).
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Close out any session left active by a previous process that died
    /// without stopping. Call once at startup, before the first
    /// `start_monitoring`.
    pub async fn recover_abandoned(&self) -> Result<Option<String>> {
        self.manager.lock().await.recover_abandoned(Utc::now()).await
    }

    /// Begin a monitoring session and return its id. Fails with
    /// [`MonitorError::AlreadyActive`] if one is running, and with
    /// [`MonitorError::NoSensorsAvailable`] if no enabled sensor comes up,
    /// in which case no session is created.
    pub async fn start_monitoring(&self) -> Result<String> {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return Err(MonitorError::AlreadyActive.into());
        }

        let mut sensors = SensorSet::build(self.sensors.as_ref(), self.config.sensor_toggles());
        if sensors.start_all() == 0 {
            sensors.stop_all();
            return Err(MonitorError::NoSensorsAvailable.into());
        }
        let wake = WakeGuard::acquire(self.sensors.wake_lock());

        let session = match self.manager.lock().await.start_session(Utc::now()).await {
            Ok(session) => session,
            Err(err) => {
                sensors.stop_all();
                return Err(err);
            }
        };

        self.snapshot_tx.send_replace(MonitorSnapshot {
            is_monitoring: true,
            session_id: Some(session.id.clone()),
            ..MonitorSnapshot::default()
        });

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(
            session.id.clone(),
            self.manager.clone(),
            self.config.clone(),
            sensors,
            wake,
            self.snapshot_tx.clone(),
            self.sample_interval,
            cancel.clone(),
        ));

        log_info!("monitoring started for session {}", session.id);
        *worker = Some(LoopHandle {
            session_id: session.id.clone(),
            handle,
            cancel,
        });

        Ok(session.id)
    }

    /// Stop the running session and return its report. Returns `Ok(None)`
    /// when nothing is running, so repeated stops are harmless.
    pub async fn stop_monitoring(&self) -> Result<Option<SleepReport>> {
        let mut worker = self.worker.lock().await;
        let Some(LoopHandle {
            session_id,
            handle,
            cancel,
        }) = worker.take()
        else {
            log_info!("stop requested with no active session");
            return Ok(None);
        };

        cancel.cancel();
        if let Err(err) = handle.await {
            log_error!("sampling loop for session {session_id} did not exit cleanly: {err}");
        }

        let thresholds = self.config.current_thresholds();
        let (_, report) = self
            .manager
            .lock()
            .await
            .end_session(&session_id, Utc::now(), &thresholds, self.sample_interval)
            .await?;

        self.snapshot_tx.send_replace(MonitorSnapshot::default());
        log_info!("monitoring stopped for session {session_id}");

        Ok(Some(report))
    }

    /// Observe the live monitoring state without locking.
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn is_monitoring(&self) -> bool {
        self.snapshot_tx.borrow().is_monitoring
    }
}
