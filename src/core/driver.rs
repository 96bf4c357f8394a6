//! Capability traits implemented by every device backend.
//!
//! Each trait has a hardware-backed implementation under `devices::linux` and a
//! simulated one under `devices::mock`. The backend is picked once at startup
//! by `devices::probe`; callers only ever see `Box<dyn ...>`.

use crate::core::types::{ImuReading, MotorStatus, ServoPreset};
use crate::error::Result;
use std::thread;
use std::time::Duration;

/// Ultrasonic distance sensor
pub trait DistanceSensor: Send {
    /// Take one measurement in cm.
    ///
    /// Bounded in time. Fails with `Error::DeviceTimeout` when the echo never
    /// arrives and `Error::OutOfRange` outside 2-400 cm.
    fn measure(&mut self) -> Result<f32>;

    /// Last valid measurement (0.0 before the first)
    fn last_distance(&self) -> f32;

    /// Release hardware handles
    fn cleanup(&mut self) {}
}

/// Accelerometer + gyroscope
pub trait InertialSensor: Send {
    /// Read every channel. Never fails: bus errors degrade to an at-rest sample.
    fn read_all(&mut self) -> ImuReading;

    /// Release hardware handles
    fn cleanup(&mut self) {}
}

/// Positional servo
pub trait ServoActuator: Send {
    /// Move to `angle` degrees (clamped to 0-180) and return the realized
    /// angle. Blocks for the servo's settle time.
    fn set_angle(&mut self, angle: i32) -> Result<u8>;

    /// Current position
    fn angle(&self) -> u8;

    /// Move to a named position
    fn move_to_preset(&mut self, preset: ServoPreset) -> Result<u8> {
        self.set_angle(preset.angle())
    }

    /// Step from `start` to `end` (inclusive) in `step` degree increments,
    /// pausing `delay` between steps. Returns the final angle.
    fn sweep(&mut self, start: i32, end: i32, step: u32, delay: Duration) -> Result<u8> {
        let step = step.max(1) as i32;
        let mut angle = start;
        loop {
            self.set_angle(angle)?;
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            if angle == end {
                break;
            }
            angle = if start <= end {
                (angle + step).min(end)
            } else {
                (angle - step).max(end)
            };
        }
        Ok(self.angle())
    }

    /// Manual override button state
    fn button_pressed(&mut self) -> bool {
        false
    }

    /// Release hardware handles
    fn cleanup(&mut self) {}
}

/// H-bridge driven DC motor
pub trait DriveMotor: Send {
    /// Spin forward at `speed` percent (clamped to 0-100)
    fn forward(&mut self, speed: i32) -> Result<MotorStatus>;

    /// Spin backward at `speed` percent (clamped to 0-100)
    fn backward(&mut self, speed: i32) -> Result<MotorStatus>;

    /// Coast to a stop
    fn stop(&mut self) -> Result<MotorStatus>;

    /// Short both motor terminals, then stop. Slower than `stop`.
    fn brake(&mut self) -> Result<MotorStatus>;

    /// Change duty without touching direction; returns the applied speed
    fn set_speed(&mut self, speed: i32) -> Result<u8>;

    /// Current status
    fn status(&self) -> MotorStatus;

    /// Stop the motor and release hardware handles
    fn cleanup(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingServo {
        angle: u8,
        moves: Vec<u8>,
    }

    impl ServoActuator for RecordingServo {
        fn set_angle(&mut self, angle: i32) -> Result<u8> {
            self.angle = crate::core::types::clamp_angle(angle);
            self.moves.push(self.angle);
            Ok(self.angle)
        }

        fn angle(&self) -> u8 {
            self.angle
        }
    }

    #[test]
    fn test_sweep_ascending_hits_end() {
        let mut servo = RecordingServo { angle: 90, moves: vec![] };
        let last = servo.sweep(0, 45, 20, Duration::ZERO).unwrap();
        assert_eq!(servo.moves, vec![0, 20, 40, 45]);
        assert_eq!(last, 45);
    }

    #[test]
    fn test_sweep_descending() {
        let mut servo = RecordingServo { angle: 90, moves: vec![] };
        servo.sweep(180, 150, 10, Duration::ZERO).unwrap();
        assert_eq!(servo.moves, vec![180, 170, 160, 150]);
    }

    #[test]
    fn test_preset_moves() {
        let mut servo = RecordingServo { angle: 0, moves: vec![] };
        assert_eq!(servo.move_to_preset(ServoPreset::Center).unwrap(), 90);
        assert_eq!(servo.move_to_preset(ServoPreset::Max).unwrap(), 180);
    }
}
