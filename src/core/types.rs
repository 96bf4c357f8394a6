//! Value types exchanged between devices, the state store and the API.
//!
//! - [`ImuReading`]: converted IMU sample (m/s², °/s, tilt degrees)
//! - [`MotorStatus`]: drive motor state with its derived fields
//! - [`DistanceReading`]: last distance outcome, including "no data" cases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Standard gravity used to convert g to m/s²
pub const GRAVITY: f32 = 9.81;

/// Servo travel limits (degrees)
pub const SERVO_MIN_ANGLE: i64 = 0;
pub const SERVO_MAX_ANGLE: i64 = 180;

/// Motor duty limits (percent)
pub const MOTOR_MIN_SPEED: i64 = 0;
pub const MOTOR_MAX_SPEED: i64 = 100;

/// Speed used when a drive command carries none
pub const DEFAULT_DRIVE_SPEED: i64 = 50;

/// Sentinel published as `distance` when no valid reading exists
pub const DISTANCE_INVALID_CM: f32 = -1.0;

/// Round to a fixed number of decimals
#[inline]
pub fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

/// Clamp a requested angle to the servo's travel.
///
/// Callers are expected to have validated already; a clamp here means the
/// validation layer let something through, so it is logged.
pub fn clamp_angle(angle: i32) -> u8 {
    let clamped = (angle as i64).clamp(SERVO_MIN_ANGLE, SERVO_MAX_ANGLE);
    if clamped != angle as i64 {
        log::warn!("Servo angle {} clamped to {}", angle, clamped);
    }
    clamped as u8
}

/// Clamp a requested speed to 0-100%.
pub fn clamp_speed(speed: i32) -> u8 {
    let clamped = (speed as i64).clamp(MOTOR_MIN_SPEED, MOTOR_MAX_SPEED);
    if clamped != speed as i64 {
        log::warn!("Motor speed {} clamped to {}", speed, clamped);
    }
    clamped as u8
}

/// Full IMU sample as exposed by the API.
///
/// Accelerations in m/s², angular rates in °/s, rotations in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuReading {
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    /// Die temperature (°C)
    pub temperature_c: f32,
}

impl ImuReading {
    /// Reading of a level sensor at rest: 1 g on Z, no rotation.
    pub fn at_rest() -> Self {
        Self {
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: GRAVITY,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            temperature_c: 25.0,
        }
    }

    /// Build a reading from accelerometer values in g and gyro values in °/s.
    ///
    /// Tilt angles come from the accelerometer vector: each axis against the
    /// Euclidean magnitude of the other two. X rotation is negated so that
    /// tipping the nose down reads positive.
    pub fn from_raw_units(accel_g: [f32; 3], gyro_dps: [f32; 3], temperature_c: f32) -> Self {
        let [x, y, z] = accel_g;
        let rotation_x = -x.atan2(y.hypot(z)).to_degrees();
        let rotation_y = y.atan2(x.hypot(z)).to_degrees();

        Self {
            accel_x: round_to(x * GRAVITY, 3),
            accel_y: round_to(y * GRAVITY, 3),
            accel_z: round_to(z * GRAVITY, 3),
            gyro_x: round_to(gyro_dps[0], 2),
            gyro_y: round_to(gyro_dps[1], 2),
            gyro_z: round_to(gyro_dps[2], 2),
            rotation_x: round_to(rotation_x, 2),
            rotation_y: round_to(rotation_y, 2),
            temperature_c: round_to(temperature_c, 2),
        }
    }

    /// Accelerometer vector in g
    pub fn accel_g(&self) -> [f32; 3] {
        [
            self.accel_x / GRAVITY,
            self.accel_y / GRAVITY,
            self.accel_z / GRAVITY,
        ]
    }

    /// Gyroscope vector in °/s
    pub fn gyro_dps(&self) -> [f32; 3] {
        [self.gyro_x, self.gyro_y, self.gyro_z]
    }
}

impl Default for ImuReading {
    fn default() -> Self {
        Self::at_rest()
    }
}

/// Mean offsets measured while the sensor lies flat and still
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImuCalibration {
    /// Accelerometer offset in g (Z already has 1 g removed)
    pub accel_offset: [f32; 3],
    /// Gyroscope offset in °/s
    pub gyro_offset: [f32; 3],
    pub samples: usize,
}

/// Running sum of IMU samples taken while the sensor lies flat.
/// Z is expected to read 1 g.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImuCalibrator {
    accel_sum: [f32; 3],
    gyro_sum: [f32; 3],
    samples: usize,
}

impl ImuCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reading: &ImuReading) {
        let accel = reading.accel_g();
        let gyro = reading.gyro_dps();
        for axis in 0..3 {
            self.accel_sum[axis] += accel[axis];
            self.gyro_sum[axis] += gyro[axis];
        }
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Mean offsets; `None` before the first sample
    pub fn finish(&self) -> Option<ImuCalibration> {
        if self.samples == 0 {
            return None;
        }
        let n = self.samples as f32;
        Some(ImuCalibration {
            accel_offset: [
                self.accel_sum[0] / n,
                self.accel_sum[1] / n,
                self.accel_sum[2] / n - 1.0,
            ],
            gyro_offset: [
                self.gyro_sum[0] / n,
                self.gyro_sum[1] / n,
                self.gyro_sum[2] / n,
            ],
            samples: self.samples,
        })
    }
}

/// Drive direction of the DC motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorState {
    #[default]
    Stopped,
    Forward,
    Backward,
}

impl MotorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorState::Stopped => "stopped",
            MotorState::Forward => "forward",
            MotorState::Backward => "backward",
        }
    }
}

impl fmt::Display for MotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drive motor status.
///
/// Only `state` and `speed` are stored; `is_running` and `direction` are
/// derived on serialization so they can never disagree with `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "MotorStatusWire")]
pub struct MotorStatus {
    state: MotorState,
    speed: u8,
}

/// JSON shape of [`MotorStatus`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorStatusWire {
    pub state: MotorState,
    pub speed: u8,
    pub is_running: bool,
    pub direction: Option<MotorState>,
}

impl From<MotorStatus> for MotorStatusWire {
    fn from(status: MotorStatus) -> Self {
        Self {
            state: status.state,
            speed: status.speed,
            is_running: status.is_running(),
            direction: status.direction(),
        }
    }
}

impl MotorStatus {
    /// Motor halted, zero duty
    pub fn stopped() -> Self {
        Self {
            state: MotorState::Stopped,
            speed: 0,
        }
    }

    /// Motor turning in `state` at `speed` percent (clamped to 100)
    pub fn running(state: MotorState, speed: u8) -> Self {
        if state == MotorState::Stopped {
            return Self::stopped();
        }
        Self {
            state,
            speed: speed.min(MOTOR_MAX_SPEED as u8),
        }
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.state != MotorState::Stopped
    }

    pub fn direction(&self) -> Option<MotorState> {
        self.is_running().then_some(self.state)
    }

    /// Same state with a new duty; direction is left untouched
    pub fn with_speed(self, speed: u8) -> Self {
        Self {
            state: self.state,
            speed: speed.min(MOTOR_MAX_SPEED as u8),
        }
    }
}

/// Outcome of the most recent distance measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DistanceReading {
    /// Sensor switched off; no measurement taken
    #[default]
    Disabled,
    /// Enabled, but no cycle has completed yet
    Pending,
    /// Valid echo, distance in cm
    Measured(f32),
    /// Echo never arrived within the bound
    Timeout,
    /// Echo outside the sensor's 2-400 cm range
    OutOfRange,
}

impl DistanceReading {
    /// Numeric value published as `distance` (0 disabled, -1 invalid)
    pub fn as_cm(&self) -> f32 {
        match self {
            DistanceReading::Disabled | DistanceReading::Pending => 0.0,
            DistanceReading::Measured(cm) => *cm,
            DistanceReading::Timeout | DistanceReading::OutOfRange => DISTANCE_INVALID_CM,
        }
    }

    /// Short tag published as `distance_status`
    pub fn status(&self) -> &'static str {
        match self {
            DistanceReading::Disabled => "disabled",
            DistanceReading::Pending => "pending",
            DistanceReading::Measured(_) => "ok",
            DistanceReading::Timeout => "timeout",
            DistanceReading::OutOfRange => "out_of_range",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DistanceReading::Measured(_))
    }
}

/// Named servo positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoPreset {
    Min,
    Center,
    Max,
}

impl ServoPreset {
    pub fn angle(&self) -> i32 {
        match self {
            ServoPreset::Min => SERVO_MIN_ANGLE as i32,
            ServoPreset::Center => 90,
            ServoPreset::Max => SERVO_MAX_ANGLE as i32,
        }
    }
}

impl FromStr for ServoPreset {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" | "left" => Ok(ServoPreset::Min),
            "center" | "middle" => Ok(ServoPreset::Center),
            "max" | "right" => Ok(ServoPreset::Max),
            other => Err(crate::error::Error::InvalidArgument(format!(
                "Unknown servo position: {}",
                other
            ))),
        }
    }
}

/// Which implementation backs a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Hardware,
    Simulated,
}
