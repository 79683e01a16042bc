use log::{debug, error};

use super::probe::LuxProbe;
use super::SensorReadingSource;

/// Ambient light monitor. Reports raw illuminance in lux, no transform.
pub struct LightSensor {
    probe: Box<dyn LuxProbe>,
    monitoring: bool,
    last_lux: f32,
}

impl LightSensor {
    pub fn new(probe: Box<dyn LuxProbe>) -> Self {
        Self {
            probe,
            monitoring: false,
            last_lux: 0.0,
        }
    }
}

impl SensorReadingSource for LightSensor {
    fn start(&mut self) {
        if self.monitoring {
            return;
        }
        match self.probe.start() {
            Ok(()) => {
                self.monitoring = true;
                debug!("light monitoring started");
            }
            Err(err) => {
                error!("failed to start light monitoring: {err:?}");
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
        self.last_lux = 0.0;
        debug!("light monitoring stopped");
    }

    fn current_value(&mut self) -> f32 {
        if !self.monitoring {
            return 0.0;
        }
        self.last_lux = self.probe.illuminance();
        self.last_lux
    }

    fn is_monitoring(&self) -> bool {
        self.monitoring
    }
}
