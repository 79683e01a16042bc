use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_u32},
    models::SleepReport,
};

fn row_to_report(row: &Row) -> Result<SleepReport> {
    let created_at: String = row.get("created_at")?;
    let sleep_score: i64 = row.get("sleep_score")?;
    let snoring_events: i64 = row.get("snoring_events")?;
    let movement_events: i64 = row.get("movement_events")?;
    let average_heart_rate: Option<f64> = row.get("average_heart_rate")?;
    let recommendations_json: String = row.get("recommendations_json")?;

    Ok(SleepReport {
        session_id: row.get("session_id")?,
        total_sleep_time_min: row.get("total_sleep_time_min")?,
        awake_min: row.get("awake_min")?,
        light_min: row.get("light_min")?,
        deep_min: row.get("deep_min")?,
        rem_min: row.get("rem_min")?,
        sleep_score: u8::try_from(sleep_score)
            .map_err(|_| anyhow!("sleep_score {sleep_score} out of range"))?,
        sleep_efficiency: row.get("sleep_efficiency")?,
        sleep_latency_min: row.get("sleep_latency_min")?,
        rem_latency_min: row.get("rem_latency_min")?,
        waso_min: row.get("waso_min")?,
        snoring_events: to_u32(snoring_events, "snoring_events")?,
        movement_events: to_u32(movement_events, "movement_events")?,
        average_heart_rate: average_heart_rate.map(|hr| hr as f32),
        recommendations: serde_json::from_str(&recommendations_json)
            .context("failed to deserialize recommendations")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_report(&self, report: &SleepReport) -> Result<()> {
        let record = report.clone();
        self.execute(move |conn| {
            let recommendations_json = serde_json::to_string(&record.recommendations)
                .context("failed to serialize recommendations")?;

            conn.execute(
                "INSERT INTO reports (
                    session_id,
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
                    average_heart_rate,
                    recommendations_json,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    record.session_id,
                    record.total_sleep_time_min,
                    record.awake_min,
                    record.light_min,
                    record.deep_min,
                    record.rem_min,
                    i64::from(record.sleep_score),
                    record.sleep_efficiency,
                    record.sleep_latency_min,
                    record.rem_latency_min,
                    record.waso_min,
                    i64::from(record.snoring_events),
                    i64::from(record.movement_events),
                    record.average_heart_rate.map(f64::from),
                    recommendations_json,
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_report_for_session(&self, session_id: &str) -> Result<Option<SleepReport>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, total_sleep_time_min, awake_min, light_min, deep_min, rem_min,
                        sleep_score, sleep_efficiency, sleep_latency_min, rem_latency_min,
                        waso_min, snoring_events, movement_events, average_heart_rate,
                        recommendations_json, created_at
                 FROM reports
                 WHERE session_id = ?1",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_report(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Average sleep efficiency over reports created since `since`, for the
    /// statistics screens.
    pub async fn average_efficiency_since(&self, since: DateTime<Utc>) -> Result<Option<f64>> {
        let since = since.to_rfc3339();
        self.execute(move |conn| {
            let avg: Option<f64> = conn.query_row(
                "SELECT AVG(sleep_efficiency) FROM reports WHERE created_at >= ?1",
                params![since],
                |row| row.get(0),
            )?;
            Ok(avg)
        })
        .await
    }
}
