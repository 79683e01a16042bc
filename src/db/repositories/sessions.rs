use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime},
    models::Session,
};

fn row_to_session(row: &Row) -> Result<Session> {
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let quality_score: i64 = row.get("quality_score")?;

    Ok(Session {
        id: row.get("id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        is_active: row.get("is_active")?,
        quality_score: u8::try_from(quality_score)
            .map_err(|_| anyhow!("quality_score {quality_score} out of range"))?,
        notes: row.get("notes")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

const SESSION_COLUMNS: &str =
    "id, started_at, ended_at, is_active, quality_score, notes, created_at, updated_at";

impl Database {
    pub async fn insert_session(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, started_at, ended_at, is_active, quality_score, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.is_active,
                    i64::from(record.quality_score),
                    record.notes,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn update_session(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE sessions
                 SET ended_at = ?1,
                     is_active = ?2,
                     quality_score = ?3,
                     notes = ?4,
                     updated_at = ?5
                 WHERE id = ?6",
                params![
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.is_active,
                    i64::from(record.quality_score),
                    record.notes,
                    record.updated_at.to_rfc3339(),
                    record.id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("session {} not found", record.id));
            }
            Ok(())
        })
        .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;

            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_session(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn get_active_session(&self) -> Result<Option<Session>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE is_active = 1
                 ORDER BY started_at DESC
                 LIMIT 1"
            ))?;

            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_session(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE is_active = 0
                 ORDER BY started_at DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    /// Delete a session; its samples and report go with it via ON DELETE
    /// CASCADE.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
            Ok(())
        })
        .await
    }

    /// Average quality score over sessions started since `since`. `None` when
    /// no session qualifies.
    pub async fn average_score_since(&self, since: DateTime<Utc>) -> Result<Option<f64>> {
        let since = since.to_rfc3339();
        self.execute(move |conn| {
            let avg: Option<f64> = conn.query_row(
                "SELECT AVG(quality_score) FROM sessions
                 WHERE is_active = 0 AND started_at >= ?1",
                params![since],
                |row| row.get(0),
            )?;
            Ok(avg)
        })
        .await
    }

    /// Average session duration in minutes over sessions started since
    /// `since`.
    pub async fn average_duration_since(&self, since: DateTime<Utc>) -> Result<Option<f64>> {
        let since = since.to_rfc3339();
        self.execute(move |conn| {
            let avg: Option<f64> = conn.query_row(
                "SELECT AVG((julianday(ended_at) - julianday(started_at)) * 1440.0)
                 FROM sessions
                 WHERE is_active = 0 AND ended_at IS NOT NULL AND started_at >= ?1",
                params![since],
                |row| row.get(0),
            )?;
            Ok(avg)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn insert_and_fetch_roundtrip() {
        let (_dir, db) = test_db().await;
        let session = Session::begin(Utc::now());
        db.insert_session(&session).await.unwrap();

        let fetched = db.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched, session);
        assert_eq!(db.get_session("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn active_session_lookup_tracks_lifecycle() {
        let (_dir, db) = test_db().await;
        assert!(db.get_active_session().await.unwrap().is_none());

        let mut session = Session::begin(Utc::now());
        db.insert_session(&session).await.unwrap();
        assert_eq!(
            db.get_active_session().await.unwrap().unwrap().id,
            session.id
        );

        session.ended_at = Some(session.started_at + Duration::hours(8));
        session.is_active = false;
        session.quality_score = 77;
        session.updated_at = session.ended_at.unwrap();
        db.update_session(&session).await.unwrap();

        assert!(db.get_active_session().await.unwrap().is_none());
        let listed = db.list_sessions().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].quality_score, 77);
    }

    #[tokio::test]
    async fn aggregate_queries_average_over_ended_sessions() {
        let (_dir, db) = test_db().await;
        let since = Utc::now() - Duration::days(7);

        assert!(db.average_score_since(since).await.unwrap().is_none());
        assert!(db.average_duration_since(since).await.unwrap().is_none());

        for (score, hours) in [(60u8, 6i64), (80, 8)] {
            let mut session = Session::begin(Utc::now());
            session.ended_at = Some(session.started_at + Duration::hours(hours));
            session.is_active = false;
            session.quality_score = score;
            db.insert_session(&session).await.unwrap();
        }

        let avg_score = db.average_score_since(since).await.unwrap().unwrap();
        assert!((avg_score - 70.0).abs() < 1e-6);

        let avg_duration = db.average_duration_since(since).await.unwrap().unwrap();
        assert!((avg_duration - 420.0).abs() < 0.01);
    }
}
