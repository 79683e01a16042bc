//! Sensor abstraction: three reading sources (sound, motion, light) behind a
//! uniform start/read/stop contract, plus the wake-resource guard the sampling
//! loop holds while a session runs.
//!
//! Physical acquisition sits behind the probe traits in [`probe`]; the monitor
//! types in this module apply the per-domain transforms (dB conversion,
//! gravity filtering) and own the monitoring lifecycle.

mod light;
mod motion;
pub mod probe;
mod sound;

pub use light::LightSensor;
pub use motion::MovementSensor;
pub use sound::SoundMonitor;

use log::{error, info};

use crate::config::SensorToggles;
use probe::{AccelerometerProbe, AmplitudeProbe, LuxProbe};

/// One sleep sensor. `start` never surfaces a failure: a missing or broken
/// sensor degrades into a "no reading" state and `current_value` reports 0.0.
/// `stop` is idempotent and releases the underlying resources.
pub trait SensorReadingSource: Send {
    fn start(&mut self);
    fn stop(&mut self);
    fn current_value(&mut self) -> f32;
    fn is_monitoring(&self) -> bool;
}

/// A wake-lock-like resource that keeps the device sampling while a session
/// runs. Hosts with real power management supply their own implementation.
pub trait WakeLock: Send {
    fn acquire(&mut self);
    fn release(&mut self);
}

/// Default for hosts without power management.
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}

/// RAII wrapper so the wake resource is released on every exit path of the
/// sampling loop, including panics and internal errors.
pub struct WakeGuard {
    lock: Box<dyn WakeLock>,
    held: bool,
}

impl WakeGuard {
    pub fn acquire(mut lock: Box<dyn WakeLock>) -> Self {
        lock.acquire();
        Self { lock, held: true }
    }

    pub fn release(&mut self) {
        if self.held {
            self.lock.release();
            self.held = false;
        }
    }
}

impl Drop for WakeGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Supplies probes for whatever hardware the host actually has. `None` means
/// the sensor is absent on this device.
pub trait SensorProvider: Send + Sync {
    fn sound_probe(&self) -> Option<Box<dyn AmplitudeProbe>>;
    fn motion_probe(&self) -> Option<Box<dyn AccelerometerProbe>>;
    fn light_probe(&self) -> Option<Box<dyn LuxProbe>>;

    fn wake_lock(&self) -> Box<dyn WakeLock> {
        Box::new(NoopWakeLock)
    }
}

/// Rand-driven probes for demos and development machines without sensors.
pub struct SimulatedSensors;

impl SensorProvider for SimulatedSensors {
    fn sound_probe(&self) -> Option<Box<dyn AmplitudeProbe>> {
        Some(Box::new(probe::SimulatedMicrophone::new()))
    }

    fn motion_probe(&self) -> Option<Box<dyn AccelerometerProbe>> {
        Some(Box::new(probe::SimulatedAccelerometer::new()))
    }

    fn light_probe(&self) -> Option<Box<dyn LuxProbe>> {
        Some(Box::new(probe::SimulatedLightMeter::new()))
    }
}

/// Combined readings for one sampling tick. Absent sensors contribute 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorReadings {
    pub sound_db: f32,
    pub movement: f32,
    pub light_lux: f32,
}

/// The three sources for one session, built from a provider and the user's
/// toggles. Owned exclusively by the sampling loop, which serializes all
/// start/read/stop calls.
pub struct SensorSet {
    sound: Option<SoundMonitor>,
    motion: Option<MovementSensor>,
    light: Option<LightSensor>,
}

impl SensorSet {
    pub fn build(provider: &dyn SensorProvider, toggles: SensorToggles) -> Self {
        Self {
            sound: toggles
                .sound
                .then(|| provider.sound_probe())
                .flatten()
                .map(SoundMonitor::new),
            motion: toggles
                .motion
                .then(|| provider.motion_probe())
                .flatten()
                .map(MovementSensor::new),
            light: toggles
                .light
                .then(|| provider.light_probe())
                .flatten()
                .map(LightSensor::new),
        }
    }

    /// Start every configured source and report how many are actually
    /// monitoring afterwards. Individual failures are logged inside the
    /// sources, never propagated.
    pub fn start_all(&mut self) -> usize {
        let mut active = 0;
        for source in self.sources_mut() {
            source.start();
            if source.is_monitoring() {
                active += 1;
            }
        }
        info!("sensor startup: {active} source(s) monitoring");
        active
    }

    /// Best-effort stop of every source. One sensor failing to release must
    /// never block the others, so each stop is isolated.
    pub fn stop_all(&mut self) {
        for source in self.sources_mut() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| source.stop()));
            if result.is_err() {
                error!("sensor stop panicked, continuing with remaining sensors");
            }
        }
    }

    /// Pull one value from each source. Sources that are absent, disabled, or
    /// failed read as 0.0 so a tick always produces a complete sample.
    pub fn read(&mut self) -> SensorReadings {
        SensorReadings {
            sound_db: self
                .sound
                .as_mut()
                .map(SensorReadingSource::current_value)
                .unwrap_or(0.0),
            movement: self
                .motion
                .as_mut()
                .map(SensorReadingSource::current_value)
                .unwrap_or(0.0),
            light_lux: self
                .light
                .as_mut()
                .map(SensorReadingSource::current_value)
                .unwrap_or(0.0),
        }
    }

    fn sources_mut(&mut self) -> impl Iterator<Item = &mut dyn SensorReadingSource> {
        self.sound
            .iter_mut()
            .map(|s| s as &mut dyn SensorReadingSource)
            .chain(
                self.motion
                    .iter_mut()
                    .map(|s| s as &mut dyn SensorReadingSource),
            )
            .chain(
                self.light
                    .iter_mut()
                    .map(|s| s as &mut dyn SensorReadingSource),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::probe::tests::{ScriptedAccelerometer, ScriptedLightMeter, ScriptedMicrophone};
    use super::*;

    struct ScriptedProvider;

    impl SensorProvider for ScriptedProvider {
        fn sound_probe(&self) -> Option<Box<dyn AmplitudeProbe>> {
            Some(Box::new(ScriptedMicrophone::constant(16000.0)))
        }

        fn motion_probe(&self) -> Option<Box<dyn AccelerometerProbe>> {
            Some(Box::new(ScriptedAccelerometer::constant([0.0, 0.0, 9.81])))
        }

        fn light_probe(&self) -> Option<Box<dyn LuxProbe>> {
            Some(Box::new(ScriptedLightMeter::constant(3.0)))
        }
    }

    struct NoHardware;

    impl SensorProvider for NoHardware {
        fn sound_probe(&self) -> Option<Box<dyn AmplitudeProbe>> {
            None
        }
        fn motion_probe(&self) -> Option<Box<dyn AccelerometerProbe>> {
            None
        }
        fn light_probe(&self) -> Option<Box<dyn LuxProbe>> {
            None
        }
    }

    #[test]
    fn all_sensors_start_and_read() {
        let mut set = SensorSet::build(&ScriptedProvider, SensorToggles::default());
        assert_eq!(set.start_all(), 3);

        let readings = set.read();
        assert!(readings.sound_db > 0.0);
        assert_eq!(readings.light_lux, 3.0);
        set.stop_all();
    }

    #[test]
    fn disabled_sensors_read_zero() {
        let toggles = SensorToggles {
            sound: false,
            motion: false,
            light: true,
        };
        let mut set = SensorSet::build(&ScriptedProvider, toggles);
        assert_eq!(set.start_all(), 1);

        let readings = set.read();
        assert_eq!(readings.sound_db, 0.0);
        assert_eq!(readings.movement, 0.0);
        assert_eq!(readings.light_lux, 3.0);
    }

    #[test]
    fn absent_hardware_starts_nothing() {
        let mut set = SensorSet::build(&NoHardware, SensorToggles::default());
        assert_eq!(set.start_all(), 0);
        let readings = set.read();
        assert_eq!(readings.sound_db, 0.0);
        assert_eq!(readings.movement, 0.0);
        assert_eq!(readings.light_lux, 0.0);
    }

    #[test]
    fn wake_guard_releases_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct CountingLock(Arc<AtomicUsize>);
        impl WakeLock for CountingLock {
            fn acquire(&mut self) {}
            fn release(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let releases = Arc::new(AtomicUsize::new(0));
        let mut guard = WakeGuard::acquire(Box::new(CountingLock(releases.clone())));
        guard.release();
        drop(guard);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
