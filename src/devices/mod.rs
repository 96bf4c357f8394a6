//! Device backends and the startup probe
//!
//! [`probe`] decides once, per capability, whether the real device or its
//! simulation is used. The rest of the daemon only sees the trait objects in
//! [`DeviceSet`].

pub mod linux;
pub mod mock;

use crate::config::{Config, HardwareMode};
use crate::core::driver::{DistanceSensor, DriveMotor, InertialSensor, ServoActuator};
use crate::core::types::Backend;
use crate::error::{Error, Result};
use linux::{Hcsr04, L298nMotor, L298nPins, Mpu6050, Sg90Pins, Sg90Servo};
use mock::{MockImu, MockMotor, MockServo, MockUltrasonic, NoiseGenerator};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Servo position assumed before the first command
const INITIAL_SERVO_ANGLE: u8 = 90;

/// Which backend ended up behind each capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Backends {
    pub distance: Backend,
    pub imu: Backend,
    pub servo: Backend,
    pub motor: Backend,
}

/// The four capabilities the daemon drives
pub struct DeviceSet {
    pub distance: Box<dyn DistanceSensor>,
    pub imu: Box<dyn InertialSensor>,
    pub servo: Box<dyn ServoActuator>,
    pub motor: Box<dyn DriveMotor>,
    pub backends: Backends,
}

impl DeviceSet {
    /// All-simulated set, used by `mode = "simulated"` and by tests
    pub fn simulated(config: &Config) -> Self {
        let sim = &config.simulation;
        let mut noise = NoiseGenerator::new(sim.random_seed);

        Self {
            distance: Box::new(MockUltrasonic::new(
                noise.fork(),
                sim.distance_min_cm,
                sim.distance_max_cm,
            )),
            imu: Box::new(MockImu::new(noise.fork())),
            servo: Box::new(MockServo::new(
                INITIAL_SERVO_ANGLE,
                Duration::from_millis(sim.servo_settle_ms),
            )),
            motor: Box::new(MockMotor::new(Duration::from_millis(sim.brake_ms))),
            backends: Backends {
                distance: Backend::Simulated,
                imu: Backend::Simulated,
                servo: Backend::Simulated,
                motor: Backend::Simulated,
            },
        }
    }
}

/// Pick a backend for every capability according to `[hardware] mode`
///
/// - `simulated`: never touches hardware
/// - `hardware`: any unavailable device aborts startup
/// - `auto`: unavailable devices fall back to simulation with one warning each
pub fn probe(config: &Config) -> Result<DeviceSet> {
    let mode = config.hardware.mode;
    if mode == HardwareMode::Simulated {
        log::info!("Hardware mode 'simulated': all devices simulated");
        return Ok(DeviceSet::simulated(config));
    }

    let hw = &config.hardware;
    let pins = &config.pins;
    let sim = &config.simulation;
    let gpio_root = Path::new(&hw.gpio_root);
    let mut noise = NoiseGenerator::new(sim.random_seed);

    let (distance, distance_backend) = select(
        mode,
        "distance sensor",
        || -> Result<Box<dyn DistanceSensor>> {
            require_gpio(gpio_root)?;
            Ok(Box::new(Hcsr04::new(gpio_root, pins.trig, pins.echo)?))
        },
        || -> Box<dyn DistanceSensor> {
            Box::new(MockUltrasonic::new(
                noise.fork(),
                sim.distance_min_cm,
                sim.distance_max_cm,
            ))
        },
    )?;

    let (imu, imu_backend) = select(
        mode,
        "IMU",
        || -> Result<Box<dyn InertialSensor>> {
            let bus = linux::i2c::bus_path(hw.i2c_bus);
            if !bus.exists() {
                return Err(Error::DeviceUnavailable(format!(
                    "{} not present",
                    bus.display()
                )));
            }
            Ok(Box::new(Mpu6050::new(&bus, pins.mpu6050_address)?))
        },
        || -> Box<dyn InertialSensor> { Box::new(MockImu::new(noise.fork())) },
    )?;

    let (servo, servo_backend) = select(
        mode,
        "servo",
        || -> Result<Box<dyn ServoActuator>> {
            let extras = Sg90Pins {
                gpio_root,
                led: gpio_root.exists().then_some(pins.servo_led),
                button: gpio_root.exists().then_some(pins.servo_button),
            };
            Ok(Box::new(Sg90Servo::new(
                Path::new(&hw.pwm_root),
                hw.pwm_chip,
                pins.servo_pwm_channel,
                extras,
            )?))
        },
        || -> Box<dyn ServoActuator> {
            Box::new(MockServo::new(
                INITIAL_SERVO_ANGLE,
                Duration::from_millis(sim.servo_settle_ms),
            ))
        },
    )?;

    let (motor, motor_backend) = select(
        mode,
        "DC motor",
        || -> Result<Box<dyn DriveMotor>> {
            require_gpio(gpio_root)?;
            let motor_pins = L298nPins {
                in1: pins.motor_in1,
                in2: pins.motor_in2,
                ena: pins.motor_ena,
            };
            Ok(Box::new(L298nMotor::new(
                gpio_root,
                motor_pins,
                hw.motor_pwm_hz,
            )?))
        },
        || -> Box<dyn DriveMotor> { Box::new(MockMotor::new(Duration::from_millis(sim.brake_ms))) },
    )?;

    let backends = Backends {
        distance: distance_backend,
        imu: imu_backend,
        servo: servo_backend,
        motor: motor_backend,
    };
    log::info!("Device backends: {:?}", backends);

    Ok(DeviceSet {
        distance,
        imu,
        servo,
        motor,
        backends,
    })
}

/// Try the hardware constructor, falling back to simulation in `auto` mode
fn select<T: ?Sized>(
    mode: HardwareMode,
    name: &str,
    hardware: impl FnOnce() -> Result<Box<T>>,
    simulated: impl FnOnce() -> Box<T>,
) -> Result<(Box<T>, Backend)> {
    match hardware() {
        Ok(device) => {
            log::info!("{}: hardware", name);
            Ok((device, Backend::Hardware))
        }
        Err(e) if mode == HardwareMode::Auto => {
            log::warn!("{} unavailable ({}), using simulation", name, e);
            Ok((simulated(), Backend::Simulated))
        }
        Err(e) => Err(Error::DeviceUnavailable(format!("{}: {}", name, e))),
    }
}

fn require_gpio(root: &Path) -> Result<()> {
    if root.join("export").exists() {
        Ok(())
    } else {
        Err(Error::DeviceUnavailable(format!(
            "{} not present",
            root.display()
        )))
    }
}
