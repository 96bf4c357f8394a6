//! HC-SR04 ultrasonic ranger over sysfs GPIO
//!
//! ```text
//! TRIG ──┐10µs┌────────────────────────────
//!        └────┘
//! ECHO ──────────┐ pulse ∝ distance ┌──────
//!                └──────────────────┘
//! distance_cm = pulse_s × 34300 / 2
//! ```
//!
//! Each edge wait is bounded by `timeout` (100 ms), so one measurement never
//! blocks longer than roughly twice that.

use super::sysfs::{Direction, GpioPin};
use crate::core::driver::DistanceSensor;
use crate::core::types::round_to;
use crate::error::{Error, Result};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Speed of sound at ~20°C (cm/s)
const SPEED_OF_SOUND_CM_S: f32 = 34_300.0;

/// Physical measuring window of the sensor (cm)
pub const MIN_RANGE_CM: f32 = 2.0;
pub const MAX_RANGE_CM: f32 = 400.0;

const TRIGGER_PULSE: Duration = Duration::from_micros(10);
const SETTLE_TIME: Duration = Duration::from_millis(500);

/// Default bound for each echo edge
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(100);

/// Convert an echo pulse width into a range-checked distance
pub fn pulse_to_distance(pulse: Duration) -> Result<f32> {
    let distance = round_to(pulse.as_secs_f32() * SPEED_OF_SOUND_CM_S / 2.0, 2);
    if !(MIN_RANGE_CM..=MAX_RANGE_CM).contains(&distance) {
        return Err(Error::OutOfRange {
            distance_cm: distance,
        });
    }
    Ok(distance)
}

/// HC-SR04 driver
pub struct Hcsr04 {
    trig: GpioPin,
    echo: GpioPin,
    timeout: Duration,
    last_distance: f32,
}

impl Hcsr04 {
    /// Claim the trigger/echo lines and let the sensor settle
    pub fn new(gpio_root: &Path, trig_pin: u32, echo_pin: u32) -> Result<Self> {
        let trig = GpioPin::open(gpio_root, trig_pin, Direction::Out)?;
        let echo = GpioPin::open(gpio_root, echo_pin, Direction::In)?;
        trig.write(false)?;
        thread::sleep(SETTLE_TIME);

        log::info!(
            "HC-SR04 ready (TRIG=GPIO{}, ECHO=GPIO{})",
            trig_pin,
            echo_pin
        );

        Ok(Self {
            trig,
            echo,
            timeout: ECHO_TIMEOUT,
            last_distance: 0.0,
        })
    }

    /// Spin until ECHO reads `level`; returns the instant it did
    fn wait_for_echo(&self, level: bool, what: &'static str) -> Result<Instant> {
        let start = Instant::now();
        loop {
            let now = Instant::now();
            if self.echo.read()? == level {
                return Ok(now);
            }
            if now.duration_since(start) > self.timeout {
                return Err(Error::DeviceTimeout(what));
            }
        }
    }
}

impl DistanceSensor for Hcsr04 {
    fn measure(&mut self) -> Result<f32> {
        self.trig.write(true)?;
        thread::sleep(TRIGGER_PULSE);
        self.trig.write(false)?;

        let pulse_start = self.wait_for_echo(true, "echo rise")?;
        let pulse_end = self.wait_for_echo(false, "echo fall")?;

        let distance = pulse_to_distance(pulse_end.duration_since(pulse_start))?;
        self.last_distance = distance;
        Ok(distance)
    }

    fn last_distance(&self) -> f32 {
        self.last_distance
    }

    fn cleanup(&mut self) {
        let _ = self.trig.write(false);
        log::info!("HC-SR04 released");
    }
}
