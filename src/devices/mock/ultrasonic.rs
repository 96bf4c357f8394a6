//! Simulated HC-SR04: random distance within a configured window

use super::noise::NoiseGenerator;
use crate::core::driver::DistanceSensor;
use crate::core::types::round_to;
use crate::error::Result;

/// Mock ultrasonic sensor
pub struct MockUltrasonic {
    noise: NoiseGenerator,
    min_cm: f32,
    max_cm: f32,
    last_distance: f32,
}

impl MockUltrasonic {
    pub fn new(noise: NoiseGenerator, min_cm: f32, max_cm: f32) -> Self {
        log::info!(
            "Distance sensor running in simulation ({:.0}-{:.0} cm)",
            min_cm,
            max_cm
        );
        Self {
            noise,
            min_cm,
            max_cm,
            last_distance: 0.0,
        }
    }
}

impl DistanceSensor for MockUltrasonic {
    fn measure(&mut self) -> Result<f32> {
        let distance = round_to(self.noise.uniform(self.min_cm, self.max_cm), 2);
        self.last_distance = distance;
        Ok(distance)
    }

    fn last_distance(&self) -> f32 {
        self.last_distance
    }
}
