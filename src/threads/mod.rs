//! Long-running background threads.

pub mod poller;

pub use poller::{SensorPoller, SharedDistanceSensor, SharedInertialSensor, poll_once};
