//! State shared between the sensor poller and the HTTP handlers.
//!
//! - `StateStore`: the single lock-protected [`SharedState`]
//! - `SharedStateHandle`: `Arc` handle passed to every thread

mod shared;

pub use shared::{SharedState, SharedStateHandle, StateStore, create_shared_state};
