//! Configuration for YantraIO daemon
//!
//! Loads configuration from a TOML file. Every section falls back to defaults
//! matching the usual Raspberry Pi wiring, so an empty file (or no file at
//! all) yields a runnable simulated setup.
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0:5000"
//!
//! [poller]
//! interval_ms = 300
//!
//! [hardware]
//! mode = "auto"        # auto | hardware | simulated
//!
//! [pins]
//! servo = 18
//! motor_in1 = 16
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub pins: PinConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    ///
    /// Examples:
    /// - `0.0.0.0:5000` - all interfaces on port 5000
    /// - `127.0.0.1:5000` - localhost only
    pub bind_address: String,
    /// Per-connection read timeout (milliseconds)
    pub read_timeout_ms: u64,
    /// Largest accepted request body (bytes)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            read_timeout_ms: 2000,
            max_body_bytes: 16 * 1024,
        }
    }
}

/// Background sensor poller configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Sleep between poll cycles (milliseconds)
    pub interval_ms: u64,
    /// Keep reading the IMU while the distance sensor is disabled
    pub imu_while_disabled: bool,
    /// Start polling as soon as the daemon is up
    pub autostart: bool,
}

/// Shortest accepted poll interval (milliseconds)
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

impl PollerConfig {
    /// Sleep between cycles, never shorter than `MIN_POLL_INTERVAL_MS`
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 300,
            imu_while_disabled: false,
            autostart: true,
        }
    }
}

/// How device backends are selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareMode {
    /// Use hardware where the kernel interface is present, simulate the rest
    #[default]
    Auto,
    /// Fail startup if any device is unavailable
    Hardware,
    /// Never touch hardware
    Simulated,
}

/// Kernel interface locations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub mode: HardwareMode,
    /// sysfs GPIO root
    pub gpio_root: String,
    /// sysfs PWM root
    pub pwm_root: String,
    /// i2c-dev bus number (`/dev/i2c-N`)
    pub i2c_bus: u8,
    /// PWM chip index used for the servo
    pub pwm_chip: u8,
    /// Software PWM frequency for the motor enable line (Hz)
    pub motor_pwm_hz: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            mode: HardwareMode::Auto,
            gpio_root: "/sys/class/gpio".to_string(),
            pwm_root: "/sys/class/pwm".to_string(),
            i2c_bus: 1,
            pwm_chip: 0,
            motor_pwm_hz: 1000,
        }
    }
}

/// BCM pin assignments
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PinConfig {
    /// Servo PWM output
    pub servo: u32,
    /// PWM channel on `pwm_chip` wired to the servo pin
    pub servo_pwm_channel: u32,
    /// Servo status LED
    pub servo_led: u32,
    /// Manual servo button
    pub servo_button: u32,
    /// L298N IN1
    pub motor_in1: u32,
    /// L298N IN2
    pub motor_in2: u32,
    /// L298N ENA (speed)
    pub motor_ena: u32,
    /// HC-SR04 trigger
    pub trig: u32,
    /// HC-SR04 echo (through a voltage divider)
    pub echo: u32,
    /// MPU-6050 I2C address
    pub mpu6050_address: u16,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            servo: 18,
            servo_pwm_channel: 0,
            servo_led: 12,
            servo_button: 25,
            motor_in1: 16,
            motor_in2: 20,
            motor_ena: 21,
            trig: 23,
            echo: 24,
            mpu6050_address: 0x68,
        }
    }
}

/// Simulated device behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed, 0 = random each run
    pub random_seed: u64,
    /// Time the simulated servo takes to reach a position (milliseconds)
    pub servo_settle_ms: u64,
    /// Time the simulated motor spends braking (milliseconds)
    pub brake_ms: u64,
    /// Lower bound of simulated distances (cm)
    pub distance_min_cm: f32,
    /// Upper bound of simulated distances (cm)
    pub distance_max_cm: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            random_seed: 0,
            servo_settle_ms: 300,
            brake_ms: 100,
            distance_min_cm: 5.0,
            distance_max_cm: 200.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter (trace, debug, info, warn, error); `RUST_LOG` wins
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use yantra_io::config::Config;
    ///
    /// let config = Config::load("yantra-io.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poller.interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(Error::InvalidArgument(format!(
                "poller.interval_ms must be at least {}",
                MIN_POLL_INTERVAL_MS
            )));
        }
        Ok(())
    }

    /// Configuration for tests and demos: simulated devices, no settle delays,
    /// fixed seed.
    pub fn simulated() -> Self {
        Self {
            hardware: HardwareConfig {
                mode: HardwareMode::Simulated,
                ..Default::default()
            },
            simulation: SimulationConfig {
                random_seed: 42,
                servo_settle_ms: 0,
                brake_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
