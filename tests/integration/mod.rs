//! Integration tests for yantra-io using simulated devices
//!
//! Every test builds its own `ControlPanel` over `DeviceSet::simulated` with
//! a fixed seed and zero settle/brake times, so the suite needs no hardware.
//!
//! ```bash
//! cargo test --test integration -- --nocapture
//! ```

mod control;
mod harness;
mod http_api;
mod poller;
