//! YantraIO - control daemon for a servo, a DC motor, an HC-SR04 ranger and
//! an MPU-6050 IMU on a single-board computer
//!
//! ## Architecture
//!
//! ```text
//!  HTTP handlers ──► ControlPanel ──► servo / motor drivers
//!                        │
//!                        ▼
//!                   StateStore ◄── SensorPoller ◄── distance / IMU drivers
//! ```
//!
//! Every device has a hardware-backed driver (`devices::linux`) and a
//! simulated one (`devices::mock`); `devices::probe` picks per device at
//! startup.

pub mod config;
pub mod control;
pub mod core;
pub mod devices;
pub mod error;
pub mod http;
pub mod state;
pub mod threads;

// Re-export commonly used types
pub use config::Config;
pub use control::ControlPanel;
pub use error::{Error, Result};
