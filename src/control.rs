//! Command/query façade used by the HTTP handlers.
//!
//! Every command validates its input first and fails with
//! `Error::InvalidArgument` before anything is touched. Accepted commands run
//! against the device while holding that actuator's own lock, then merge the
//! realized result into the state store. The state lock is never held across
//! device I/O.

use crate::config::{Config, PinConfig};
use crate::core::driver::{DriveMotor, ServoActuator};
use crate::core::types::{
    Backend, DEFAULT_DRIVE_SPEED, ImuCalibration, ImuCalibrator, MOTOR_MAX_SPEED, MOTOR_MIN_SPEED,
    MotorStatus, SERVO_MAX_ANGLE, SERVO_MIN_ANGLE, ServoPreset,
};
use crate::devices::{Backends, DeviceSet};
use crate::error::{Error, Result};
use crate::state::{SharedState, SharedStateHandle};
use crate::threads::{SensorPoller, SharedDistanceSensor, SharedInertialSensor};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Limits for requests that can keep an actuator busy for a while
const MAX_SWEEP_DELAY_MS: i64 = 1000;
const MAX_CALIBRATION_SAMPLES: i64 = 1000;
const CALIBRATION_INTERVAL: Duration = Duration::from_millis(10);

/// Pin map reported by `/api/status`
#[derive(Debug, Clone, Serialize)]
pub struct GpioPins {
    pub servo: u32,
    pub servo_led: u32,
    pub servo_button: u32,
    pub motor_in1: u32,
    pub motor_in2: u32,
    pub motor_ena: u32,
    pub trig: u32,
    pub echo: u32,
    pub mpu6050_address: u16,
}

impl From<&PinConfig> for GpioPins {
    fn from(pins: &PinConfig) -> Self {
        Self {
            servo: pins.servo,
            servo_led: pins.servo_led,
            servo_button: pins.servo_button,
            motor_in1: pins.motor_in1,
            motor_in2: pins.motor_in2,
            motor_ena: pins.motor_ena,
            trig: pins.trig,
            echo: pins.echo,
            mpu6050_address: pins.mpu6050_address,
        }
    }
}

/// System overview (`GET /api/status`)
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    /// True when at least one device runs on real hardware
    pub rpi_available: bool,
    pub sensor_thread_running: bool,
    pub backends: Backends,
    pub gpio_pins: GpioPins,
}

/// Distance sensor overview (`GET /api/sensor/status`)
#[derive(Debug, Clone, Serialize)]
pub struct SensorStatus {
    pub sensor_active: bool,
    pub distance_status: &'static str,
    /// Last valid measurement taken by the driver
    pub last_distance: f32,
    pub poll_cycles: u64,
}

/// Servo sweep request
#[derive(Debug, Clone, Copy)]
pub struct SweepRequest {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub delay_ms: i64,
}

impl Default for SweepRequest {
    fn default() -> Self {
        Self {
            start: SERVO_MIN_ANGLE,
            end: SERVO_MAX_ANGLE,
            step: 10,
            delay_ms: 100,
        }
    }
}

/// Check that `value` lies in `[min, max]`
fn require_range(value: i64, min: i64, max: i64, what: &str) -> Result<i32> {
    if (min..=max).contains(&value) {
        Ok(value as i32)
    } else {
        Err(Error::InvalidArgument(format!(
            "{} must be between {} and {}",
            what, min, max
        )))
    }
}

fn require_angle(angle: i64) -> Result<i32> {
    require_range(angle, SERVO_MIN_ANGLE, SERVO_MAX_ANGLE, "Angle")
}

fn require_speed(speed: i64) -> Result<i32> {
    require_range(speed, MOTOR_MIN_SPEED, MOTOR_MAX_SPEED, "Speed")
}

/// The daemon's single entry point for commands and queries.
pub struct ControlPanel {
    state: SharedStateHandle,
    servo: Mutex<Box<dyn ServoActuator>>,
    motor: Mutex<Box<dyn DriveMotor>>,
    distance: SharedDistanceSensor,
    imu: SharedInertialSensor,
    poller: SensorPoller,
    backends: Backends,
    pins: GpioPins,
}

impl ControlPanel {
    /// Take ownership of the probed devices. The poller is created but not
    /// started.
    pub fn new(devices: DeviceSet, state: SharedStateHandle, config: &Config) -> Self {
        let DeviceSet {
            distance,
            imu,
            servo,
            motor,
            backends,
        } = devices;

        let distance: SharedDistanceSensor = Arc::new(Mutex::new(distance));
        let imu: SharedInertialSensor = Arc::new(Mutex::new(imu));
        let poller = SensorPoller::new(
            Arc::clone(&distance),
            Arc::clone(&imu),
            Arc::clone(&state),
            config.poller.clone(),
        );

        // Actuator fields start from what the drivers report
        state.set_servo_angle(servo.angle());
        state.set_motor_status(motor.status());

        Self {
            state,
            servo: Mutex::new(servo),
            motor: Mutex::new(motor),
            distance,
            imu,
            poller,
            backends,
            pins: GpioPins::from(&config.pins),
        }
    }

    // === Queries ===

    /// Full copy of the shared state
    pub fn snapshot(&self) -> SharedState {
        self.state.snapshot()
    }

    pub fn motor_status(&self) -> MotorStatus {
        self.state.motor_status()
    }

    pub fn system_status(&self) -> SystemStatus {
        let b = self.backends;
        let any_hardware = [b.distance, b.imu, b.servo, b.motor]
            .contains(&Backend::Hardware);
        SystemStatus {
            rpi_available: any_hardware,
            sensor_thread_running: self.poller.is_running(),
            backends: b,
            gpio_pins: self.pins.clone(),
        }
    }

    pub fn sensor_status(&self) -> SensorStatus {
        let last_distance = self.distance.lock().last_distance();
        let snap = self.state.snapshot();
        SensorStatus {
            sensor_active: snap.sensor_enabled,
            distance_status: snap.distance.status(),
            last_distance,
            poll_cycles: snap.poll_cycles,
        }
    }

    /// Manual override button on the servo board
    pub fn servo_button_pressed(&self) -> bool {
        self.servo.lock().button_pressed()
    }

    // === Distance sensor ===

    pub fn enable_distance_sensor(&self) -> bool {
        let enabled = self.state.set_sensor_enabled(true);
        log::info!("Distance sensor enabled");
        enabled
    }

    pub fn disable_distance_sensor(&self) -> bool {
        let enabled = self.state.set_sensor_enabled(false);
        log::info!("Distance sensor disabled");
        enabled
    }

    // === Servo ===

    /// Move the servo; returns the realized angle
    pub fn set_servo_angle(&self, angle: i64) -> Result<u8> {
        let angle = require_angle(angle)?;
        let mut servo = self.servo.lock();
        let realized = servo.set_angle(angle)?;
        self.state.set_servo_angle(realized);
        log::info!("Servo moved to {}°", realized);
        Ok(realized)
    }

    pub fn move_servo_to_preset(&self, preset: ServoPreset) -> Result<u8> {
        let mut servo = self.servo.lock();
        let realized = servo.move_to_preset(preset)?;
        self.state.set_servo_angle(realized);
        log::info!("Servo moved to {:?} ({}°)", preset, realized);
        Ok(realized)
    }

    /// Sweep the servo; the servo stays locked for the whole sweep
    pub fn sweep_servo(&self, request: SweepRequest) -> Result<u8> {
        let start = require_angle(request.start)?;
        let end = require_angle(request.end)?;
        let step = require_range(request.step, 1, SERVO_MAX_ANGLE, "Step")?;
        let delay = require_range(request.delay_ms, 0, MAX_SWEEP_DELAY_MS, "Delay")?;

        let mut servo = self.servo.lock();
        let result = servo.sweep(start, end, step as u32, Duration::from_millis(delay as u64));
        // Record where the horn actually is, even if a step failed midway
        self.state.set_servo_angle(servo.angle());
        let realized = result?;
        log::info!("Servo swept {}° → {}° (step {})", start, end, step);
        Ok(realized)
    }

    // === Drive motor ===

    /// Forward at `speed` percent (50 when `None`)
    pub fn drive_forward(&self, speed: Option<i64>) -> Result<MotorStatus> {
        let speed = require_speed(speed.unwrap_or(DEFAULT_DRIVE_SPEED))?;
        let mut motor = self.motor.lock();
        let status = motor.forward(speed)?;
        self.state.set_motor_status(status);
        log::info!("Motor forward at {}%", status.speed());
        Ok(status)
    }

    /// Backward at `speed` percent (50 when `None`)
    pub fn drive_backward(&self, speed: Option<i64>) -> Result<MotorStatus> {
        let speed = require_speed(speed.unwrap_or(DEFAULT_DRIVE_SPEED))?;
        let mut motor = self.motor.lock();
        let status = motor.backward(speed)?;
        self.state.set_motor_status(status);
        log::info!("Motor backward at {}%", status.speed());
        Ok(status)
    }

    pub fn stop_motor(&self) -> Result<MotorStatus> {
        let mut motor = self.motor.lock();
        let status = motor.stop()?;
        self.state.set_motor_status(status);
        log::info!("Motor stopped");
        Ok(status)
    }

    pub fn brake_motor(&self) -> Result<MotorStatus> {
        let mut motor = self.motor.lock();
        let status = motor.brake()?;
        self.state.set_motor_status(status);
        log::info!("Motor braked");
        Ok(status)
    }

    /// Change duty only; direction and running state are kept
    pub fn set_motor_speed(&self, speed: i64) -> Result<u8> {
        let speed = require_speed(speed)?;
        let mut motor = self.motor.lock();
        let applied = motor.set_speed(speed)?;
        self.state.set_motor_speed(applied);
        log::info!("Motor speed set to {}%", applied);
        Ok(applied)
    }

    // === IMU ===

    /// Average `samples` readings into offsets. Nothing is stored.
    ///
    /// The IMU lock is held for one sample at a time, never across the sleep.
    pub fn calibrate_imu(&self, samples: i64) -> Result<ImuCalibration> {
        let samples = require_range(samples, 1, MAX_CALIBRATION_SAMPLES, "Samples")? as usize;
        let mut calibrator = ImuCalibrator::new();
        while calibrator.samples() < samples {
            let reading = self.imu.lock().read_all();
            calibrator.add(&reading);
            if calibrator.samples() < samples {
                thread::sleep(CALIBRATION_INTERVAL);
            }
        }
        let calibration = calibrator
            .finish()
            .ok_or_else(|| Error::Other("IMU calibration took no samples".into()))?;
        log::info!(
            "IMU calibrated over {} samples: accel {:?} g, gyro {:?} °/s",
            calibration.samples,
            calibration.accel_offset,
            calibration.gyro_offset
        );
        Ok(calibration)
    }

    // === Lifecycle ===

    /// Start background polling. Returns `false` if it was already running.
    pub fn start_polling(&self) -> Result<bool> {
        self.poller.start()
    }

    /// Stop background polling and wait for the current cycle.
    pub fn stop_polling(&self) -> bool {
        self.poller.stop()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Stop polling, halt the motor, release every device.
    pub fn shutdown(&self) {
        if self.poller.stop() {
            log::info!("Sensor poller joined");
        }

        {
            let mut motor = self.motor.lock();
            match motor.stop() {
                Ok(status) => self.state.set_motor_status(status),
                Err(e) => log::warn!("Failed to stop motor: {}", e),
            }
            motor.cleanup();
        }
        self.servo.lock().cleanup();
        self.distance.lock().cleanup();
        self.imu.lock().cleanup();
        log::info!("All devices released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MotorState;
    use crate::state::create_shared_state;

    fn panel() -> ControlPanel {
        let config = Config::simulated();
        ControlPanel::new(DeviceSet::simulated(&config), create_shared_state(), &config)
    }

    #[test]
    fn test_servo_validation_leaves_state() {
        let panel = panel();
        assert_eq!(panel.set_servo_angle(45).unwrap(), 45);

        let err = panel.set_servo_angle(181).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(panel.set_servo_angle(-1).is_err());
        assert_eq!(panel.snapshot().servo_angle, 45);
    }

    #[test]
    fn test_drive_defaults_to_half_speed() {
        let panel = panel();
        let status = panel.drive_backward(None).unwrap();
        assert_eq!(status.state(), MotorState::Backward);
        assert_eq!(status.speed(), 50);
        assert_eq!(panel.motor_status(), status);
    }

    #[test]
    fn test_speed_validation() {
        let panel = panel();
        panel.drive_forward(Some(20)).unwrap();
        assert!(panel.drive_forward(Some(101)).is_err());
        assert!(panel.set_motor_speed(-5).is_err());
        assert_eq!(panel.motor_status().speed(), 20);

        assert_eq!(panel.set_motor_speed(100).unwrap(), 100);
        assert_eq!(panel.motor_status().state(), MotorState::Forward);
    }

    #[test]
    fn test_brake_and_stop_agree() {
        let panel = panel();
        panel.drive_forward(Some(60)).unwrap();
        let braked = panel.brake_motor().unwrap();
        let stopped = panel.stop_motor().unwrap();
        assert_eq!(braked, stopped);
        assert_eq!(panel.stop_motor().unwrap(), stopped);
    }

    #[test]
    fn test_preset_and_sweep() {
        let panel = panel();
        assert_eq!(panel.move_servo_to_preset(ServoPreset::Max).unwrap(), 180);
        let last = panel
            .sweep_servo(SweepRequest {
                start: 0,
                end: 30,
                step: 10,
                delay_ms: 0,
            })
            .unwrap();
        assert_eq!(last, 30);
        assert_eq!(panel.snapshot().servo_angle, 30);

        let bad = SweepRequest {
            step: 0,
            ..Default::default()
        };
        assert!(panel.sweep_servo(bad).is_err());
    }

    #[test]
    fn test_calibrate_imu() {
        let panel = panel();
        let cal = panel.calibrate_imu(5).unwrap();
        assert_eq!(cal.samples, 5);
        assert!(cal.accel_offset[2].abs() < 0.1);
        assert!(panel.calibrate_imu(0).is_err());
    }

    #[test]
    fn test_system_status_simulated() {
        let panel = panel();
        let status = panel.system_status();
        assert!(!status.rpi_available);
        assert!(!status.sensor_thread_running);
        assert_eq!(status.gpio_pins.trig, 23);
    }

    #[test]
    fn test_shutdown_stops_motor() {
        let panel = panel();
        panel.start_polling().unwrap();
        panel.drive_forward(Some(80)).unwrap();
        panel.shutdown();
        assert!(!panel.is_polling());
        assert_eq!(panel.motor_status(), MotorStatus::stopped());
    }
}
