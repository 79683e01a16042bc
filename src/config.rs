use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// Classification thresholds, injected per classification call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Sound level above which a sample counts as snoring/vocalization (dB).
    pub sound_db: f32,
    /// Linear acceleration magnitude above which the sleeper is moving (m/s²).
    /// Canonical default is 2.5; the legacy preferences default of 1.5 was
    /// never read by the classifier and is not carried over.
    pub movement: f32,
    /// Ambient light above which the room is too bright for deep sleep (lux).
    pub light_lux: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sound_db: 60.0,
            movement: 2.5,
            light_lux: 5.0,
        }
    }
}

/// Per-sensor enable switches. A disabled sensor reads as 0.0, which keeps
/// classification well-defined with any subset of hardware present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SensorToggles {
    pub sound: bool,
    pub motion: bool,
    pub light: bool,
}

impl Default for SensorToggles {
    fn default() -> Self {
        Self {
            sound: true,
            motion: true,
            light: true,
        }
    }
}

/// Pull-based configuration boundary. The sampling loop reads current values
/// on every tick, so threshold edits apply mid-session without a restart.
pub trait ConfigSource: Send + Sync {
    fn current_thresholds(&self) -> Thresholds;
    fn sensor_toggles(&self) -> SensorToggles;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UserPreferences {
    thresholds: Thresholds,
    sensors: SensorToggles,
}

/// File-backed preferences with write-through persistence.
pub struct PreferencesStore {
    path: PathBuf,
    data: RwLock<UserPreferences>,
}

impl PreferencesStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read preferences from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserPreferences::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn update_thresholds(&self, thresholds: Thresholds) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.thresholds = thresholds;
        self.persist(&guard)
    }

    pub fn update_sensor_toggles(&self, sensors: SensorToggles) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.sensors = sensors;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserPreferences) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write preferences to {}", self.path.display()))
    }
}

impl ConfigSource for PreferencesStore {
    fn current_thresholds(&self) -> Thresholds {
        self.data.read().unwrap().thresholds
    }

    fn sensor_toggles(&self) -> SensorToggles {
        self.data.read().unwrap().sensors
    }
}

/// Fixed configuration, mostly for tests and embedders without a settings UI.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    pub thresholds: Thresholds,
    pub sensors: SensorToggles,
}

impl ConfigSource for StaticConfig {
    fn current_thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn sensor_toggles(&self) -> SensorToggles {
        self.sensors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::new(dir.path().join("prefs.json")).unwrap();
        assert_eq!(store.current_thresholds(), Thresholds::default());
        assert_eq!(store.sensor_toggles(), SensorToggles::default());
    }

    #[test]
    fn updates_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = PreferencesStore::new(path.clone()).unwrap();
        store
            .update_thresholds(Thresholds {
                sound_db: 55.0,
                movement: 1.8,
                light_lux: 12.0,
            })
            .unwrap();
        store
            .update_sensor_toggles(SensorToggles {
                sound: true,
                motion: false,
                light: true,
            })
            .unwrap();

        let reloaded = PreferencesStore::new(path).unwrap();
        assert_eq!(reloaded.current_thresholds().sound_db, 55.0);
        assert_eq!(reloaded.current_thresholds().movement, 1.8);
        assert!(!reloaded.sensor_toggles().motion);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        let store = PreferencesStore::new(path).unwrap();
        assert_eq!(store.current_thresholds(), Thresholds::default());
    }
}
