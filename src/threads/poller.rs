//! Sensor poller - background distance/IMU sampling.
//!
//! While running, each cycle:
//! 1. Reads the distance enable flag from the state store
//! 2. If enabled: measures distance, reads the IMU, publishes both in one
//!    store update
//! 3. If disabled: skips the devices (or reads only the IMU when
//!    `imu_while_disabled` is set)
//! 4. Sleeps the configured interval; a stop request cuts the sleep short
//!
//! Stopping is cooperative: an in-flight measurement finishes, then the
//! thread exits and is joined.

use crate::config::PollerConfig;
use crate::core::driver::{DistanceSensor, InertialSensor};
use crate::core::types::DistanceReading;
use crate::error::{Error, Result};
use crate::state::SharedStateHandle;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Distance sensor shared between the poller and shutdown cleanup
pub type SharedDistanceSensor = Arc<Mutex<Box<dyn DistanceSensor>>>;

/// IMU shared between the poller, calibration requests and shutdown cleanup
pub type SharedInertialSensor = Arc<Mutex<Box<dyn InertialSensor>>>;

/// Log every Nth failed distance measurement that is not a plain timeout
const FAULT_LOG_EVERY: u64 = 50;

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Start/stop handle for the polling thread
pub struct SensorPoller {
    distance: SharedDistanceSensor,
    imu: SharedInertialSensor,
    state: SharedStateHandle,
    config: PollerConfig,
    worker: Mutex<Option<Worker>>,
}

impl SensorPoller {
    pub fn new(
        distance: SharedDistanceSensor,
        imu: SharedInertialSensor,
        state: SharedStateHandle,
        config: PollerConfig,
    ) -> Self {
        Self {
            distance,
            imu,
            state,
            config,
            worker: Mutex::new(None),
        }
    }

    /// Spawn the polling thread. Returns `false` if it was already running.
    pub fn start(&self) -> Result<bool> {
        let mut worker = self.worker.lock();
        if let Some(ref w) = *worker
            && !w.handle.is_finished()
        {
            return Ok(false);
        }

        let (stop_tx, stop_rx) = bounded(1);
        let distance = Arc::clone(&self.distance);
        let imu = Arc::clone(&self.imu);
        let state = Arc::clone(&self.state);
        let config = self.config.clone();

        let handle = thread::Builder::new()
            .name("sensor-poller".into())
            .spawn(move || run_poll_loop(distance, imu, state, config, stop_rx))
            .map_err(|e| Error::Other(format!("Failed to spawn sensor poller: {}", e)))?;

        *worker = Some(Worker { stop_tx, handle });
        Ok(true)
    }

    /// Signal the thread and wait for its current cycle to finish.
    /// Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let Some(worker) = self.worker.lock().take() else {
            return false;
        };
        let _ = worker.stop_tx.try_send(());
        if worker.handle.join().is_err() {
            log::error!("Sensor poller panicked");
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main polling loop.
fn run_poll_loop(
    distance: SharedDistanceSensor,
    imu: SharedInertialSensor,
    state: SharedStateHandle,
    config: PollerConfig,
    stop_rx: Receiver<()>,
) {
    let interval = config.interval();
    log::info!(
        "Sensor poller running ({}ms interval, IMU while disabled: {})",
        interval.as_millis(),
        config.imu_while_disabled
    );

    let mut faults = 0u64;

    loop {
        let loop_start = Instant::now();

        let reading = poll_once(&distance, &imu, &state, config.imu_while_disabled);
        if let Some(Err(e)) = reading {
            if faults % FAULT_LOG_EVERY == 0 {
                log::warn!("Distance measurement failed ({} so far): {}", faults + 1, e);
            }
            faults += 1;
        }

        let cycles = state.record_cycle();
        log::trace!(
            "Poll cycle {} took {}us",
            cycles,
            loop_start.elapsed().as_micros()
        );

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::info!("Sensor poller stopped");
}

/// Run a single poll cycle against the store.
///
/// Returns `None` when distance was not measured, otherwise the raw driver
/// outcome. Timeouts and out-of-range echoes are published as sentinels and
/// reported as `Some(Ok(..))`; anything else is returned as an error after
/// being published as a timeout.
pub fn poll_once(
    distance: &SharedDistanceSensor,
    imu: &SharedInertialSensor,
    state: &SharedStateHandle,
    imu_while_disabled: bool,
) -> Option<Result<DistanceReading>> {
    if !state.sensor_enabled() {
        if imu_while_disabled {
            let sample = imu.lock().read_all();
            state.update_sensors(None, Some(sample));
        }
        return None;
    }

    let measured = distance.lock().measure();
    let sample = imu.lock().read_all();

    let (reading, outcome) = match measured {
        Ok(cm) => (DistanceReading::Measured(cm), Ok(DistanceReading::Measured(cm))),
        Err(Error::DeviceTimeout(what)) => {
            log::debug!("Distance timeout ({})", what);
            (DistanceReading::Timeout, Ok(DistanceReading::Timeout))
        }
        Err(Error::OutOfRange { distance_cm }) => {
            log::debug!("Distance out of range: {:.2} cm", distance_cm);
            (DistanceReading::OutOfRange, Ok(DistanceReading::OutOfRange))
        }
        Err(e) => (DistanceReading::Timeout, Err(e)),
    };

    log::trace!("Distance {} ({})", reading.as_cm(), reading.status());
    state.update_sensors(Some(reading), Some(sample));
    Some(outcome)
}
