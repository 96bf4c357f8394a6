//! SG90 hobby servo on a hardware PWM channel
//!
//! 50 Hz frame; duty% = 2 + angle/18 (0° ≈ 2%, 180° ≈ 12%). After the settle
//! time the duty is dropped to 0 so the horn does not jitter while holding.

use super::sysfs::{Direction, GpioPin, PwmChannel};
use crate::core::driver::ServoActuator;
use crate::core::types::clamp_angle;
use crate::error::Result;
use std::path::Path;
use std::thread;
use std::time::Duration;

const SERVO_FREQUENCY_HZ: u32 = 50;
const SETTLE_TIME: Duration = Duration::from_millis(500);

/// Duty cycle (percent) that positions the horn at `angle`
pub fn angle_to_duty(angle: u8) -> f32 {
    2.0 + f32::from(angle) / 18.0
}

/// Pins a servo uses besides its PWM line
pub struct Sg90Pins<'a> {
    pub gpio_root: &'a Path,
    pub led: Option<u32>,
    pub button: Option<u32>,
}

/// SG90 driver
pub struct Sg90Servo {
    pwm: Option<PwmChannel>,
    led: Option<GpioPin>,
    button: Option<GpioPin>,
    angle: u8,
}

impl Sg90Servo {
    pub fn new(pwm_root: &Path, chip: u8, channel: u32, pins: Sg90Pins<'_>) -> Result<Self> {
        let pwm = PwmChannel::open(pwm_root, chip, channel, SERVO_FREQUENCY_HZ)?;
        pwm.set_duty_percent(0.0)?;

        // LED and button are optional extras; a missing line only costs the extra
        let led = pins.led.and_then(|pin| {
            GpioPin::open(pins.gpio_root, pin, Direction::Out)
                .inspect_err(|e| log::warn!("Servo LED on GPIO {} unavailable: {}", pin, e))
                .ok()
        });
        let button = pins.button.and_then(|pin| {
            GpioPin::open(pins.gpio_root, pin, Direction::In)
                .inspect_err(|e| log::warn!("Servo button on GPIO {} unavailable: {}", pin, e))
                .ok()
        });
        if let Some(ref led) = led {
            led.write(false)?;
        }

        log::info!("SG90 servo ready (pwmchip{}/pwm{})", chip, channel);

        Ok(Self {
            pwm: Some(pwm),
            led,
            button,
            angle: 90,
        })
    }
}

impl ServoActuator for Sg90Servo {
    fn set_angle(&mut self, angle: i32) -> Result<u8> {
        let angle = clamp_angle(angle);
        if let Some(ref pwm) = self.pwm {
            pwm.set_duty_percent(angle_to_duty(angle))?;
            thread::sleep(SETTLE_TIME);
            pwm.set_duty_percent(0.0)?;
        }
        if let Some(ref led) = self.led {
            led.write(angle > 0)?;
        }
        self.angle = angle;
        log::debug!("Servo at {}°", angle);
        Ok(angle)
    }

    fn angle(&self) -> u8 {
        self.angle
    }

    fn button_pressed(&mut self) -> bool {
        self.button
            .as_ref()
            .and_then(|b| b.read().ok())
            .unwrap_or(false)
    }

    fn cleanup(&mut self) {
        if let Some(ref led) = self.led {
            let _ = led.write(false);
        }
        // Dropping the handles disables and unexports them
        self.pwm = None;
        self.led = None;
        self.button = None;
        log::info!("SG90 servo released");
    }
}
