//! Monitoring orchestration: the session state machine, the sampling loop,
//! and the controller that translates host start/stop commands into sensor
//! and session lifecycle.

mod controller;
mod loop_worker;
mod session_manager;
mod state;

pub use controller::{MonitorController, DEFAULT_SAMPLE_INTERVAL};
pub use session_manager::SessionManager;
pub use state::MonitorSnapshot;
