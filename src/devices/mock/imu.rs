//! IMU simulator
//!
//! Produces a sensor lying roughly level: accelerometer X/Y within ±0.1 g,
//! Z within 1 ± 0.05 g, gyro within ±1 °/s. Values go through the same
//! conversion as the MPU-6050 driver so tilt angles stay consistent.

use super::noise::NoiseGenerator;
use crate::core::driver::InertialSensor;
use crate::core::types::{ImuReading, round_to};

const ACCEL_XY_SPREAD_G: f32 = 0.1;
const ACCEL_Z_SPREAD_G: f32 = 0.05;
const GYRO_SPREAD_DPS: f32 = 1.0;
const TEMPERATURE_C: f32 = 25.0;

/// Mock inertial sensor
pub struct MockImu {
    noise: NoiseGenerator,
}

impl MockImu {
    pub fn new(noise: NoiseGenerator) -> Self {
        log::info!("IMU running in simulation");
        Self { noise }
    }
}

impl InertialSensor for MockImu {
    fn read_all(&mut self) -> ImuReading {
        let accel = [
            round_to(self.noise.around(0.0, ACCEL_XY_SPREAD_G), 3),
            round_to(self.noise.around(0.0, ACCEL_XY_SPREAD_G), 3),
            round_to(self.noise.around(1.0, ACCEL_Z_SPREAD_G), 3),
        ];
        let gyro = [
            self.noise.around(0.0, GYRO_SPREAD_DPS),
            self.noise.around(0.0, GYRO_SPREAD_DPS),
            self.noise.around(0.0, GYRO_SPREAD_DPS),
        ];
        ImuReading::from_raw_units(accel, gyro, TEMPERATURE_C)
    }
}
