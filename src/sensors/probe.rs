//! Raw hardware access traits and the simulated implementations used when no
//! physical sensors are present.
//!
//! Probes deliver untransformed values; the monitor types in the parent module
//! own calibration and filtering. A probe's `start` may fail (hardware busy,
//! permission missing), but that failure never leaves the owning monitor.

use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Microphone access. Reports peak amplitude since the last read, in the
/// 0..=32767 range of a 16-bit recorder.
pub trait AmplitudeProbe: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn peak_amplitude(&mut self) -> f32;
}

/// Accelerometer access. Reports the latest raw tri-axial acceleration in
/// m/s², gravity included.
pub trait AccelerometerProbe: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn acceleration(&mut self) -> [f32; 3];
}

/// Ambient light access, in lux.
pub trait LuxProbe: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn illuminance(&mut self) -> f32;
}

const MAX_AMPLITUDE: f32 = 32767.0;
const GRAVITY: f32 = 9.81;

/// Quiet room with an occasional snore-like burst.
pub struct SimulatedMicrophone {
    rng: SmallRng,
}

impl SimulatedMicrophone {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl Default for SimulatedMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

impl AmplitudeProbe for SimulatedMicrophone {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn peak_amplitude(&mut self) -> f32 {
        if self.rng.gen_ratio(1, 12) {
            self.rng.gen_range(15_000.0..MAX_AMPLITUDE)
        } else {
            self.rng.gen_range(100.0..1_500.0)
        }
    }
}

/// Device resting on a mattress: gravity plus breathing-level jitter, with a
/// rare turn-over spike.
pub struct SimulatedAccelerometer {
    rng: SmallRng,
}

impl SimulatedAccelerometer {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl Default for SimulatedAccelerometer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerometerProbe for SimulatedAccelerometer {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn acceleration(&mut self) -> [f32; 3] {
        let jitter = |rng: &mut SmallRng| rng.gen_range(-0.05..0.05);
        let spike = if self.rng.gen_ratio(1, 30) {
            self.rng.gen_range(2.0..5.0)
        } else {
            0.0
        };
        [
            jitter(&mut self.rng) + spike,
            jitter(&mut self.rng),
            GRAVITY + jitter(&mut self.rng),
        ]
    }
}

/// Dark bedroom with slow drift.
pub struct SimulatedLightMeter {
    rng: SmallRng,
    level: f32,
}

impl SimulatedLightMeter {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            level: 1.0,
        }
    }
}

impl Default for SimulatedLightMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl LuxProbe for SimulatedLightMeter {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn illuminance(&mut self) -> f32 {
        self.level = (self.level + self.rng.gen_range(-0.2..0.2)).clamp(0.0, 4.0);
        self.level
    }
}
