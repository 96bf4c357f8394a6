//! Mock DC motor driver for testing

use crate::core::driver::DriveMotor;
use crate::core::types::{MotorState, MotorStatus, clamp_speed};
use crate::error::Result;
use std::thread;
use std::time::Duration;

/// Mock motor driver
///
/// Same state machine as the L298N driver without touching pins. `brake`
/// sleeps for the configured brake time so it stays slower than `stop`.
pub struct MockMotor {
    status: MotorStatus,
    brake_time: Duration,
}

impl MockMotor {
    pub fn new(brake_time: Duration) -> Self {
        log::info!("DC motor running in simulation");
        Self {
            status: MotorStatus::stopped(),
            brake_time,
        }
    }

    fn drive(&mut self, state: MotorState, speed: i32) -> MotorStatus {
        let speed = clamp_speed(speed);
        self.status = MotorStatus::running(state, speed);
        log::debug!("[sim] Motor {} at {}%", state, speed);
        self.status
    }
}

impl DriveMotor for MockMotor {
    fn forward(&mut self, speed: i32) -> Result<MotorStatus> {
        Ok(self.drive(MotorState::Forward, speed))
    }

    fn backward(&mut self, speed: i32) -> Result<MotorStatus> {
        Ok(self.drive(MotorState::Backward, speed))
    }

    fn stop(&mut self) -> Result<MotorStatus> {
        log::debug!("[sim] Motor stopping");
        self.status = MotorStatus::stopped();
        Ok(self.status)
    }

    fn brake(&mut self) -> Result<MotorStatus> {
        log::debug!("[sim] Motor braking");
        if !self.brake_time.is_zero() {
            thread::sleep(self.brake_time);
        }
        self.status = MotorStatus::stopped();
        Ok(self.status)
    }

    fn set_speed(&mut self, speed: i32) -> Result<u8> {
        let speed = clamp_speed(speed);
        self.status = self.status.with_speed(speed);
        Ok(speed)
    }

    fn status(&self) -> MotorStatus {
        self.status
    }

    fn cleanup(&mut self) {
        self.status = MotorStatus::stopped();
    }
}
