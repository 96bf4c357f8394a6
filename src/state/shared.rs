//! Thread-safe shared state for the control daemon.
//!
//! One `SharedState` lives behind one mutex:
//! - Poller thread: sole autonomous writer of `distance`, `imu`, `poll_cycles`
//! - HTTP handlers (via `ControlPanel`): write the actuator fields and the
//!   sensor enable flag, read snapshots
//!
//! The lock is only ever held for field copies. Device I/O happens before a
//! write and after a read, never in between.

use crate::core::types::{DistanceReading, ImuReading, MotorStatus};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Latest sensor readings and actuator positions.
#[derive(Debug, Clone, Serialize)]
#[serde(into = "SnapshotWire")]
pub struct SharedState {
    /// Outcome of the last distance cycle.
    pub distance: DistanceReading,
    /// Last IMU sample.
    pub imu: ImuReading,
    /// Whether the poller may measure distance.
    pub sensor_enabled: bool,
    /// Last realized servo angle (0-180).
    pub servo_angle: u8,
    /// Drive motor status.
    pub motor: MotorStatus,
    /// Wall clock of the last sensor write (microseconds, 0 = never).
    pub updated_at_us: u64,
    /// Completed poll cycles.
    pub poll_cycles: u64,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            distance: DistanceReading::Pending,
            imu: ImuReading::at_rest(),
            sensor_enabled: true,
            servo_angle: 90,
            motor: MotorStatus::stopped(),
            updated_at_us: 0,
            poll_cycles: 0,
        }
    }
}

/// JSON shape of a snapshot (`GET /api/data`)
#[derive(Debug, Clone, Serialize)]
struct SnapshotWire {
    distance: f32,
    distance_status: &'static str,
    imu: ImuReading,
    sensor_active: bool,
    servo_angle: u8,
    motor: MotorStatus,
    updated_at_us: u64,
    poll_cycles: u64,
}

impl From<SharedState> for SnapshotWire {
    fn from(state: SharedState) -> Self {
        Self {
            distance: state.distance.as_cm(),
            distance_status: state.distance.status(),
            imu: state.imu,
            sensor_active: state.sensor_enabled,
            servo_angle: state.servo_angle,
            motor: state.motor,
            updated_at_us: state.updated_at_us,
            poll_cycles: state.poll_cycles,
        }
    }
}

/// Lock-protected owner of the [`SharedState`].
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<SharedState>,
}

/// Handle shared between threads.
pub type SharedStateHandle = Arc<StateStore>;

/// Create a new shared state handle with startup defaults.
pub fn create_shared_state() -> SharedStateHandle {
    Arc::new(StateStore::default())
}

impl StateStore {
    /// Independent copy of the whole state.
    pub fn snapshot(&self) -> SharedState {
        self.inner.lock().clone()
    }

    pub fn sensor_enabled(&self) -> bool {
        self.inner.lock().sensor_enabled
    }

    /// Publish one poll cycle's readings atomically.
    ///
    /// A distance is dropped if the sensor was disabled while it was being
    /// measured, so a disable always wins over an in-flight cycle. Returns
    /// whether the distance was stored.
    pub fn update_sensors(&self, distance: Option<DistanceReading>, imu: Option<ImuReading>) -> bool {
        let mut state = self.inner.lock();
        let distance_stored = match distance {
            Some(reading) if state.sensor_enabled => {
                state.distance = reading;
                true
            }
            _ => false,
        };
        if let Some(imu) = imu {
            state.imu = imu;
        }
        if distance_stored || imu.is_some() {
            state.updated_at_us = now_us();
        }
        distance_stored
    }

    /// Count a finished poll cycle, whether or not it read anything.
    pub fn record_cycle(&self) -> u64 {
        let mut state = self.inner.lock();
        state.poll_cycles += 1;
        state.poll_cycles
    }

    /// Switch distance polling. Disabling publishes `Disabled` in the same
    /// critical section, so no reader sees a stale distance with the flag off.
    pub fn set_sensor_enabled(&self, enabled: bool) -> bool {
        let mut state = self.inner.lock();
        state.sensor_enabled = enabled;
        if !enabled {
            state.distance = DistanceReading::Disabled;
        } else if state.distance == DistanceReading::Disabled {
            state.distance = DistanceReading::Pending;
        }
        state.sensor_enabled
    }

    pub fn set_servo_angle(&self, angle: u8) {
        self.inner.lock().servo_angle = angle;
    }

    pub fn set_motor_status(&self, status: MotorStatus) {
        self.inner.lock().motor = status;
    }

    /// Replace only the motor duty; returns the resulting status.
    pub fn set_motor_speed(&self, speed: u8) -> MotorStatus {
        let mut state = self.inner.lock();
        state.motor = state.motor.with_speed(speed);
        state.motor
    }

    pub fn motor_status(&self) -> MotorStatus {
        self.inner.lock().motor
    }
}

fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
