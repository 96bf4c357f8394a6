//! Mock servo: clamps, waits the configured settle time, remembers the angle

use crate::core::driver::ServoActuator;
use crate::core::types::clamp_angle;
use crate::error::Result;
use std::thread;
use std::time::Duration;

/// Mock servo driver
pub struct MockServo {
    angle: u8,
    settle: Duration,
}

impl MockServo {
    pub fn new(initial_angle: u8, settle: Duration) -> Self {
        log::info!("Servo running in simulation");
        Self {
            angle: initial_angle,
            settle,
        }
    }
}

impl ServoActuator for MockServo {
    fn set_angle(&mut self, angle: i32) -> Result<u8> {
        let angle = clamp_angle(angle);
        log::debug!("[sim] Servo moving to {}°", angle);
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        self.angle = angle;
        Ok(angle)
    }

    fn angle(&self) -> u8 {
        self.angle
    }
}
