//! L298N H-bridge driving one DC motor
//!
//! | Action   | IN1 | IN2 | ENA duty |
//! |----------|-----|-----|----------|
//! | forward  | H   | L   | speed    |
//! | backward | L   | H   | speed    |
//! | stop     | L   | L   | 0        |
//! | brake    | H   | H (100 ms), then stop |

use super::soft_pwm::SoftPwm;
use super::sysfs::{Direction, GpioPin};
use crate::core::driver::DriveMotor;
use crate::core::types::{MotorState, MotorStatus, clamp_speed};
use crate::error::Result;
use std::path::Path;
use std::thread;
use std::time::Duration;

const BRAKE_TIME: Duration = Duration::from_millis(100);

/// Pin assignment for one motor channel
#[derive(Debug, Clone, Copy)]
pub struct L298nPins {
    pub in1: u32,
    pub in2: u32,
    pub ena: u32,
}

/// L298N driver
pub struct L298nMotor {
    in1: GpioPin,
    in2: GpioPin,
    ena: SoftPwm,
    status: MotorStatus,
}

impl L298nMotor {
    pub fn new(gpio_root: &Path, pins: L298nPins, pwm_hz: u32) -> Result<Self> {
        let in1 = GpioPin::open(gpio_root, pins.in1, Direction::Out)?;
        let in2 = GpioPin::open(gpio_root, pins.in2, Direction::Out)?;
        let ena = SoftPwm::start(GpioPin::open(gpio_root, pins.ena, Direction::Out)?, pwm_hz)?;

        in1.write(false)?;
        in2.write(false)?;

        log::info!(
            "L298N ready (IN1=GPIO{}, IN2=GPIO{}, ENA=GPIO{})",
            pins.in1,
            pins.in2,
            pins.ena
        );

        Ok(Self {
            in1,
            in2,
            ena,
            status: MotorStatus::stopped(),
        })
    }

    fn set_bridge(&self, in1: bool, in2: bool) -> Result<()> {
        self.in1.write(in1)?;
        self.in2.write(in2)?;
        Ok(())
    }

    fn drive(&mut self, state: MotorState, speed: i32) -> Result<MotorStatus> {
        let speed = clamp_speed(speed);
        match state {
            MotorState::Forward => self.set_bridge(true, false)?,
            MotorState::Backward => self.set_bridge(false, true)?,
            MotorState::Stopped => self.set_bridge(false, false)?,
        }
        self.ena.set_duty(speed);
        self.status = MotorStatus::running(state, speed);
        log::debug!("Motor {} at {}%", state, speed);
        Ok(self.status)
    }
}

impl DriveMotor for L298nMotor {
    fn forward(&mut self, speed: i32) -> Result<MotorStatus> {
        self.drive(MotorState::Forward, speed)
    }

    fn backward(&mut self, speed: i32) -> Result<MotorStatus> {
        self.drive(MotorState::Backward, speed)
    }

    fn stop(&mut self) -> Result<MotorStatus> {
        self.set_bridge(false, false)?;
        self.ena.set_duty(0);
        self.status = MotorStatus::stopped();
        Ok(self.status)
    }

    fn brake(&mut self) -> Result<MotorStatus> {
        self.set_bridge(true, true)?;
        thread::sleep(BRAKE_TIME);
        self.stop()
    }

    fn set_speed(&mut self, speed: i32) -> Result<u8> {
        let speed = clamp_speed(speed);
        self.ena.set_duty(speed);
        self.status = self.status.with_speed(speed);
        Ok(speed)
    }

    fn status(&self) -> MotorStatus {
        self.status
    }

    fn cleanup(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop motor during cleanup: {}", e);
        }
        self.ena.stop();
        log::info!("L298N released");
    }
}
