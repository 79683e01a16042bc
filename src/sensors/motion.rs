use log::{debug, error};

use super::probe::AccelerometerProbe;
use super::SensorReadingSource;

/// Smoothing factor for the gravity low-pass filter.
const ALPHA: f32 = 0.8;

/// Movement monitor. Low-pass-filters the raw tri-axial acceleration to
/// estimate gravity, subtracts it, and reports the Euclidean magnitude of the
/// remaining linear acceleration in m/s².
pub struct MovementSensor {
    probe: Box<dyn AccelerometerProbe>,
    monitoring: bool,
    gravity: [f32; 3],
    last_movement: f32,
}

impl MovementSensor {
    pub fn new(probe: Box<dyn AccelerometerProbe>) -> Self {
        Self {
            probe,
            monitoring: false,
            gravity: [0.0; 3],
            last_movement: 0.0,
        }
    }
}

impl SensorReadingSource for MovementSensor {
    fn start(&mut self) {
        if self.monitoring {
            return;
        }
        match self.probe.start() {
            Ok(()) => {
                self.monitoring = true;
                debug!("movement monitoring started");
            }
            Err(err) => {
                error!("failed to start movement monitoring: {err:?}");
                self.probe.stop();
            }
        }
    }

    fn stop(&mut self) {
        if !self.monitoring {
            return;
        }
        self.probe.stop();
        self.monitoring = false;
        self.gravity = [0.0; 3];
        self.last_movement = 0.0;
        debug!("movement monitoring stopped");
    }

    fn current_value(&mut self) -> f32 {
        if !self.monitoring {
            return 0.0;
        }

        let raw = self.probe.acceleration();

        // Isolate gravity with the exponential filter, then subtract it to
        // obtain linear acceleration.
        let mut linear = [0.0f32; 3];
        for axis in 0..3 {
            self.gravity[axis] = ALPHA * self.gravity[axis] + (1.0 - ALPHA) * raw[axis];
            linear[axis] = raw[axis] - self.gravity[axis];
        }

        self.last_movement =
            (linear[0] * linear[0] + linear[1] * linear[1] + linear[2] * linear[2]).sqrt();
        self.last_movement
    }

    fn is_monitoring(&self) -> bool {
        self.monitoring
    }
}
