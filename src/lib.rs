//! Background sleep-monitoring core.
//!
//! Samples ambient sound, motion, and light on a fixed cadence while a sleep
//! session is active, classifies the instantaneous sleep stage, persists
//! sessions/samples/reports to SQLite, and derives summary statistics when a
//! session ends. Host shells (mobile service wrappers, UIs) drive this crate
//! through [`monitor::MonitorController`] and observe it through the published
//! monitoring snapshot.

pub mod config;
pub mod db;
pub mod error;
pub mod monitor;
pub mod report;
pub mod sensors;
pub mod stage;
mod utils;

pub use config::{ConfigSource, PreferencesStore, SensorToggles, StaticConfig, Thresholds};
pub use db::Database;
pub use error::MonitorError;
pub use monitor::{MonitorController, MonitorSnapshot};
pub use stage::{classify, SleepStage};

/// Initialize logging for host shells (reads RUST_LOG env var).
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
