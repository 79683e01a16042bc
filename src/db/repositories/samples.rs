use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{connection::Database, helpers::parse_datetime, models::Sample};

fn row_to_sample(row: &Row) -> Result<Sample> {
    let timestamp: String = row.get("timestamp")?;
    let sound_level: f64 = row.get("sound_level")?;
    let movement_level: f64 = row.get("movement_level")?;
    let light_level: f64 = row.get("light_level")?;

    Ok(Sample {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        sound_level: sound_level as f32,
        movement_level: movement_level as f32,
        light_level: light_level as f32,
    })
}

impl Database {
    pub async fn insert_sample(&self, sample: &Sample) -> Result<()> {
        let record = sample.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO samples (session_id, timestamp, sound_level, movement_level, light_level)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.session_id,
                    record.timestamp.to_rfc3339(),
                    f64::from(record.sound_level),
                    f64::from(record.movement_level),
                    f64::from(record.light_level),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Insert a batch of samples in one transaction. Used by the sampling
    /// loop's retry path so a transient write failure never loses more than
    /// the window it is retrying.
    pub async fn insert_samples_batch(&self, samples: &[Sample]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let records = samples.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO samples (session_id, timestamp, sound_level, movement_level, light_level)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for record in &records {
                    stmt.execute(params![
                        record.session_id,
                        record.timestamp.to_rfc3339(),
                        f64::from(record.sound_level),
                        f64::from(record.movement_level),
                        f64::from(record.light_level),
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn get_samples_for_session(&self, session_id: &str) -> Result<Vec<Sample>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, timestamp, sound_level, movement_level, light_level
                 FROM samples
                 WHERE session_id = ?1
                 ORDER BY timestamp ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut samples = Vec::new();
            while let Some(row) = rows.next()? {
                samples.push(row_to_sample(row)?);
            }

            Ok(samples)
        })
        .await
    }
}
