use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::Thresholds;
use crate::db::models::{Sample, Session, SleepReport};
use crate::db::Database;
use crate::error::MonitorError;
use crate::report::aggregate;
use crate::stage::{classify, SleepStage};

/// Result of appending one sample: the classified stage and the running
/// disruption counters, ready to publish in the monitoring snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AppendOutcome {
    pub stage: SleepStage,
    pub snoring_events: u32,
    pub movement_events: u32,
}

struct ActiveSession {
    session: Session,
    samples: Vec<Sample>,
    /// Samples not yet durably written; retried on the next append.
    unsynced: Vec<Sample>,
    snoring_events: u32,
    movement_events: u32,
}

/// Owns the session state machine (NotStarted -> Active -> Ended) and the
/// in-memory sample sequence for the active session. At most one session is
/// active at a time; once a session ends its data belongs to the store and is
/// never mutated here again.
pub struct SessionManager {
    db: Database,
    active: Option<ActiveSession>,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        Self { db, active: None }
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.session.id.as_str())
    }

    /// Close out a session left active by a crash. Returns the recovered
    /// session id, if any. Call before the first `start_session`.
    pub async fn recover_abandoned(&mut self, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(mut session) = self.db.get_active_session().await? else {
            return Ok(None);
        };

        warn!(
            "recovered abandoned session {}; marking as ended",
            session.id
        );
        session.ended_at = Some(now);
        session.is_active = false;
        session.notes = "interrupted".to_string();
        session.updated_at = now;
        self.db
            .update_session(&session)
            .await
            .context("failed to finalize abandoned session")?;

        Ok(Some(session.id))
    }

    /// Start a new session. Fails with [`MonitorError::AlreadyActive`] if one
    /// is already running, leaving all state unchanged.
    pub async fn start_session(&mut self, now: DateTime<Utc>) -> Result<Session> {
        if self.active.is_some() || self.db.get_active_session().await?.is_some() {
            return Err(MonitorError::AlreadyActive.into());
        }

        let session = Session::begin(now);
        self.db
            .insert_session(&session)
            .await
            .context("failed to persist new session")?;

        info!("session {} started", session.id);
        self.active = Some(ActiveSession {
            session: session.clone(),
            samples: Vec::new(),
            unsynced: Vec::new(),
            snoring_events: 0,
            movement_events: 0,
        });

        Ok(session)
    }

    /// Append one sample to the active session. Classification and the
    /// in-memory sequence always succeed for a matching session; a durable
    /// write failure is logged and retried on the next tick (sample loss in
    /// the store is acceptable, losing it from the report is not).
    pub async fn append_sample(
        &mut self,
        sample: Sample,
        thresholds: &Thresholds,
    ) -> Result<AppendOutcome> {
        let active = match self.active.as_mut() {
            Some(active) if active.session.id == sample.session_id => active,
            Some(_) => return Err(MonitorError::StaleSession(sample.session_id).into()),
            None => return Err(MonitorError::NotActive(sample.session_id).into()),
        };

        let stage = classify(&sample, thresholds);
        if sample.sound_level > thresholds.sound_db {
            active.snoring_events += 1;
        }
        if sample.movement_level > thresholds.movement {
            active.movement_events += 1;
        }

        active.samples.push(sample.clone());
        active.unsynced.push(sample);

        match self.db.insert_samples_batch(&active.unsynced).await {
            Ok(()) => active.unsynced.clear(),
            Err(err) => warn!(
                "failed to persist {} sample(s), will retry next tick: {err:?}",
                active.unsynced.len()
            ),
        }

        Ok(AppendOutcome {
            stage,
            snoring_events: active.snoring_events,
            movement_events: active.movement_events,
        })
    }

    /// End the active session: set its end time, aggregate the report,
    /// persist both, and hand ownership of the data to the store. A second
    /// call for the same id fails with [`MonitorError::NotActive`] and leaves
    /// the recorded end time untouched.
    pub async fn end_session(
        &mut self,
        session_id: &str,
        now: DateTime<Utc>,
        thresholds: &Thresholds,
        interval: Duration,
    ) -> Result<(Session, SleepReport)> {
        let mut active = match self.active.take() {
            Some(active) if active.session.id == session_id => active,
            other => {
                self.active = other;
                return Err(MonitorError::NotActive(session_id.to_string()).into());
            }
        };

        if !active.unsynced.is_empty() {
            if let Err(err) = self.db.insert_samples_batch(&active.unsynced).await {
                warn!(
                    "dropping {} unpersisted sample(s) at session end: {err:?}",
                    active.unsynced.len()
                );
            }
        }

        active.session.ended_at = Some(now);
        active.session.is_active = false;
        active.session.updated_at = now;

        let report = aggregate(&active.session, &active.samples, thresholds, interval);
        active.session.quality_score = report.sleep_score;

        self.db
            .update_session(&active.session)
            .await
            .context("failed to finalize session")?;
        self.db
            .insert_report(&report)
            .await
            .context("failed to persist report")?;

        info!(
            "session {} ended: score {}, {} sample(s)",
            active.session.id,
            report.sleep_score,
            active.samples.len()
        );

        Ok((active.session, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_secs(5);

    async fn manager() -> (tempfile::TempDir, SessionManager) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.sqlite3")).unwrap();
        (dir, SessionManager::new(db))
    }

    fn sample_for(session_id: &str, sound: f32, movement: f32, light: f32) -> Sample {
        Sample {
            id: None,
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            sound_level: sound,
            movement_level: movement,
            light_level: light,
        }
    }

    #[tokio::test]
    async fn only_one_session_can_be_active() {
        let (_dir, mut manager) = manager().await;
        let session = manager.start_session(Utc::now()).await.unwrap();

        let err = manager.start_session(Utc::now()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<MonitorError>(),
            Some(&MonitorError::AlreadyActive)
        );
        // State unchanged: original session still active.
        assert_eq!(manager.active_session_id(), Some(session.id.as_str()));
    }

    #[tokio::test]
    async fn append_rejects_stale_session_id() {
        let (_dir, mut manager) = manager().await;
        manager.start_session(Utc::now()).await.unwrap();

        let err = manager
            .append_sample(sample_for("other", 10.0, 0.1, 1.0), &Thresholds::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonitorError>(),
            Some(MonitorError::StaleSession(id)) if id == "other"
        ));
    }

    #[tokio::test]
    async fn append_classifies_and_counts_disruptions() {
        let (_dir, mut manager) = manager().await;
        let session = manager.start_session(Utc::now()).await.unwrap();
        let thresholds = Thresholds::default();

        let outcome = manager
            .append_sample(sample_for(&session.id, 70.0, 0.1, 1.0), &thresholds)
            .await
            .unwrap();
        assert_eq!(outcome.stage, SleepStage::Rem);
        assert_eq!(outcome.snoring_events, 1);

        let outcome = manager
            .append_sample(sample_for(&session.id, 10.0, 4.0, 1.0), &thresholds)
            .await
            .unwrap();
        assert_eq!(outcome.stage, SleepStage::Awake);
        assert_eq!(outcome.movement_events, 1);
        assert_eq!(outcome.snoring_events, 1);
    }

    #[tokio::test]
    async fn end_session_is_not_repeatable() {
        let (_dir, mut manager) = manager().await;
        let session = manager.start_session(Utc::now()).await.unwrap();
        let thresholds = Thresholds::default();
        manager
            .append_sample(sample_for(&session.id, 10.0, 0.1, 1.0), &thresholds)
            .await
            .unwrap();

        let ended_at = Utc::now();
        let (ended, report) = manager
            .end_session(&session.id, ended_at, &thresholds, TICK)
            .await
            .unwrap();
        assert!(!ended.is_active);
        assert_eq!(ended.ended_at, Some(ended_at));
        assert_eq!(ended.quality_score, report.sleep_score);

        let err = manager
            .end_session(&session.id, Utc::now(), &thresholds, TICK)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonitorError>(),
            Some(MonitorError::NotActive(_))
        ));

        // The first end time is untouched in the store.
        let stored = manager.db.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.ended_at, Some(ended_at));
    }

    #[tokio::test]
    async fn ended_session_has_persisted_report_and_samples() {
        let (_dir, mut manager) = manager().await;
        let session = manager.start_session(Utc::now()).await.unwrap();
        let thresholds = Thresholds::default();

        for _ in 0..3 {
            manager
                .append_sample(sample_for(&session.id, 10.0, 0.1, 1.0), &thresholds)
                .await
                .unwrap();
        }
        let (_, report) = manager
            .end_session(&session.id, Utc::now(), &thresholds, TICK)
            .await
            .unwrap();

        let stored_report = manager
            .db
            .get_report_for_session(&session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_report, report);

        let samples = manager
            .db
            .get_samples_for_session(&session.id)
            .await
            .unwrap();
        assert_eq!(samples.len(), 3);
    }

    #[tokio::test]
    async fn recovery_closes_abandoned_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.sqlite3")).unwrap();

        // Simulate a crash: an active session exists in the store but no
        // manager owns it.
        let abandoned = Session::begin(Utc::now());
        db.insert_session(&abandoned).await.unwrap();

        let mut manager = SessionManager::new(db);
        let recovered = manager.recover_abandoned(Utc::now()).await.unwrap();
        assert_eq!(recovered, Some(abandoned.id.clone()));

        // A fresh session can start now.
        manager.start_session(Utc::now()).await.unwrap();

        let stored = manager.db.get_session(&abandoned.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.notes, "interrupted");
    }
}
