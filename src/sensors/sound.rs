use log::{debug, error};

use super::probe::AmplitudeProbe;
use super::SensorReadingSource;

const MAX_AMPLITUDE: f32 = 32767.0;
const MIN_DB: f32 = 0.0;
const MAX_DB: f32 = 90.0;

/// Ambient sound monitor. Converts the microphone's peak amplitude to a
/// decibel-like scale clamped to [0, 90].
pub struct SoundMonitor {
    probe: Box<dyn AmplitudeProbe>,
    monitoring: bool,
    last_db: f32,
}

impl SoundMonitor {
    pub fn new(probe: Box<dyn AmplitudeProbe>) -> Self {
        Self {
            probe,
            monitoring: false,
            last_db: 0.0,
        }
    }
}

/// Amplitude (0..=32767) to the 0-90 dB scale used by the classifier.
fn amplitude_to_db(amplitude: f32) -> f32 {
    let db = 20.0 * (amplitude / MAX_AMPLITUDE + 1e-6).log10() + 90.0;
    db.clamp(MIN_DB, MAX_DB)
}

impl SensorReadingSource for SoundMonitor {
    fn start(&mut self) {
        if self.monitoring {
            return;
        }
        match self.probe.start() {
            Ok(()) => {
                self.monitoring = true;
                debug!("sound monitoring started");
            }
            Err(err) => {
                // Degrade to "no reading"; the sampling loop continues with
                // the remaining sensors.
                error!("failed to start sound monitoring: {err:?}");
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
        self.last_db = 0.0;
        debug!("sound monitoring stopped");
    }

    fn current_value(&mut self) -> f32 {
        if !self.monitoring {
            return 0.0;
        }
        self.last_db = amplitude_to_db(self.probe.peak_amplitude());
        self.last_db
    }

    fn is_monitoring(&self) -> bool {
        self.monitoring
    }
}

#[cfg(test)]
mod tests {
    use super::super::probe::tests::ScriptedMicrophone;
    use super::*;

    #[test]
    fn silence_maps_to_zero_db() {
        assert_eq!(amplitude_to_db(0.0), 0.0);
    }

    #[test]
    fn full_scale_maps_to_ninety_db() {
        let db = amplitude_to_db(MAX_AMPLITUDE);
        assert!((db - 90.0).abs() < 0.01);
    }

    #[test]
    fn scale_is_monotonic() {
        let quiet = amplitude_to_db(500.0);
        let loud = amplitude_to_db(20_000.0);
        assert!(quiet < loud);
        assert!((MIN_DB..=MAX_DB).contains(&quiet));
        assert!((MIN_DB..=MAX_DB).contains(&loud));
    }

    #[test]
    fn reads_zero_when_not_monitoring() {
        let mut monitor = SoundMonitor::new(Box::new(ScriptedMicrophone::constant(30_000.0)));
        assert_eq!(monitor.current_value(), 0.0);

        monitor.start();
        assert!(monitor.current_value() > 80.0);

        monitor.stop();
        assert_eq!(monitor.current_value(), 0.0);
    }

    #[test]
    fn failed_start_degrades_silently() {
        let mut monitor = SoundMonitor::new(Box::new(ScriptedMicrophone::failing()));
        monitor.start();
        assert!(!monitor.is_monitoring());
        assert_eq!(monitor.current_value(), 0.0);
        // stop on a never-started monitor is a no-op
        monitor.stop();
    }
}
