//! MPU-6050 accelerometer/gyroscope over i2c-dev
//!
//! Default full-scale ranges after wake-up:
//! - Accelerometer ±2 g → 16384 LSB/g
//! - Gyroscope ±250 °/s → 131 LSB/(°/s)
//!
//! Registers are read in one 14-byte burst starting at ACCEL_XOUT_H:
//! accel XYZ, temperature, gyro XYZ (big-endian i16 each).

use super::i2c::I2cDevice;
use crate::core::driver::InertialSensor;
use crate::core::types::{ImuReading, round_to};
use crate::error::{Error, Result};
use std::path::Path;
use std::thread;
use std::time::Duration;

const PWR_MGMT_1: u8 = 0x6B;
const ACCEL_XOUT_H: u8 = 0x3B;
const WHO_AM_I: u8 = 0x75;
const WHO_AM_I_VALUE: u8 = 0x68;

const ACCEL_LSB_PER_G: f32 = 16384.0;
const GYRO_LSB_PER_DPS: f32 = 131.0;

/// Log the first bus error and then every Nth one
const BUS_ERROR_LOG_EVERY: u64 = 100;

/// Decoded burst: accel (g), gyro (°/s), temperature (°C)
pub fn decode_burst(raw: &[u8; 14]) -> ([f32; 3], [f32; 3], f32) {
    let word = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32;

    let accel = [
        round_to(word(0) / ACCEL_LSB_PER_G, 3),
        round_to(word(2) / ACCEL_LSB_PER_G, 3),
        round_to(word(4) / ACCEL_LSB_PER_G, 3),
    ];
    let temperature = word(6) / 340.0 + 36.53;
    let gyro = [
        word(8) / GYRO_LSB_PER_DPS,
        word(10) / GYRO_LSB_PER_DPS,
        word(12) / GYRO_LSB_PER_DPS,
    ];
    (accel, gyro, temperature)
}

/// MPU-6050 driver
pub struct Mpu6050 {
    device: I2cDevice,
    bus_errors: u64,
}

impl Mpu6050 {
    /// Open the device and take it out of sleep mode
    pub fn new(bus: &Path, address: u16) -> Result<Self> {
        let mut device = I2cDevice::open(bus, address)?;

        // Clones (MPU-6500, GY-521 variants) answer differently but share the map
        let id = device
            .read_byte_data(WHO_AM_I)
            .map_err(|e| Error::DeviceUnavailable(format!("MPU-6050 not responding: {}", e)))?;
        if id != WHO_AM_I_VALUE {
            log::warn!("Unexpected WHO_AM_I {:#04x}, continuing", id);
        }

        device.write_byte_data(PWR_MGMT_1, 0)?;
        thread::sleep(Duration::from_millis(100));

        log::info!("MPU-6050 ready at {:#04x}", address);
        Ok(Self {
            device,
            bus_errors: 0,
        })
    }

    fn read_burst(&mut self) -> Result<[u8; 14]> {
        let mut raw = [0u8; 14];
        self.device.read_registers(ACCEL_XOUT_H, &mut raw)?;
        Ok(raw)
    }
}

impl InertialSensor for Mpu6050 {
    fn read_all(&mut self) -> ImuReading {
        match self.read_burst() {
            Ok(raw) => {
                let (accel, gyro, temperature) = decode_burst(&raw);
                ImuReading::from_raw_units(accel, gyro, temperature)
            }
            Err(e) => {
                if self.bus_errors % BUS_ERROR_LOG_EVERY == 0 {
                    log::warn!(
                        "MPU-6050 read failed ({} so far): {}",
                        self.bus_errors + 1,
                        e
                    );
                }
                self.bus_errors += 1;
                ImuReading::at_rest()
            }
        }
    }

    fn cleanup(&mut self) {
        log::info!(
            "MPU-6050 {:#04x} released ({} bus errors)",
            self.device.address(),
            self.bus_errors
        );
    }
}
