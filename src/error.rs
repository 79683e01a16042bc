use thiserror::Error;

/// Session-state and startup failures surfaced to callers of the monitoring
/// API. Sensor-level problems never appear here; they degrade to zero readings
/// inside the sampling loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("a sleep session is already active")]
    AlreadyActive,

    #[error("session {0} is not the active session")]
    StaleSession(String),

    #[error("session {0} not found or already ended")]
    NotActive(String),

    #[error("no sleep sensors available, monitoring cannot start")]
    NoSensorsAvailable,
}
