//! Core abstractions for device capabilities.
//!
//! - [`driver`]: Traits to implement for new hardware
//! - [`types`]: Readings, motor status and shared constants

pub mod driver;
pub mod types;
