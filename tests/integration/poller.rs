//! Background poller behaviour and the no-torn-read guarantee

use super::harness::{simulated_panel, test_config};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use yantra_io::config::PollerConfig;
use yantra_io::core::driver::{DistanceSensor, InertialSensor};
use yantra_io::core::types::{DistanceReading, ImuReading};
use yantra_io::state::create_shared_state;
use yantra_io::threads::{SensorPoller, SharedDistanceSensor, SharedInertialSensor};
use yantra_io::Result;

/// Ranger that reports an increasing count as its distance
struct CountingRanger {
    count: Arc<AtomicU32>,
}

impl DistanceSensor for CountingRanger {
    fn measure(&mut self) -> Result<f32> {
        Ok(self.count.fetch_add(1, Ordering::SeqCst) as f32 + 10.0)
    }

    fn last_distance(&self) -> f32 {
        0.0
    }
}

/// IMU whose `gyro_x` echoes the distance the ranger last reported
struct EchoImu {
    count: Arc<AtomicU32>,
}

impl InertialSensor for EchoImu {
    fn read_all(&mut self) -> ImuReading {
        let last = self.count.load(Ordering::SeqCst).saturating_sub(1);
        ImuReading {
            gyro_x: last as f32 + 10.0,
            ..ImuReading::at_rest()
        }
    }
}

/// Wait until `cond` holds or `timeout` passes
fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn test_poller_publishes_readings() {
    let panel = simulated_panel(&test_config(5));
    panel.start_polling().unwrap();

    assert!(wait_for(Duration::from_secs(2), || {
        panel.snapshot().distance.is_valid()
    }));
    let snap = panel.snapshot();
    assert!((5.0..=200.0).contains(&snap.distance.as_cm()));
    assert!(snap.updated_at_us > 0);
    assert!(panel.system_status().sensor_thread_running);

    panel.shutdown();
    assert!(!panel.system_status().sensor_thread_running);
}

#[test]
fn test_disable_sticks_while_polling() {
    let panel = simulated_panel(&test_config(5));
    panel.start_polling().unwrap();
    assert!(wait_for(Duration::from_secs(2), || panel.snapshot().poll_cycles > 0));

    panel.disable_distance_sensor();
    let cycles = panel.snapshot().poll_cycles;
    assert!(wait_for(Duration::from_secs(2), || {
        panel.snapshot().poll_cycles >= cycles + 5
    }));
    for _ in 0..20 {
        assert_eq!(panel.snapshot().distance, DistanceReading::Disabled);
        thread::sleep(Duration::from_millis(2));
    }

    panel.enable_distance_sensor();
    assert!(wait_for(Duration::from_secs(2), || {
        panel.snapshot().distance.is_valid()
    }));
    panel.shutdown();
}

#[test]
fn test_concurrent_readers_never_see_torn_motor_status() {
    let panel = simulated_panel(&test_config(1));
    panel.start_polling().unwrap();

    thread::scope(|s| {
        for i in 0..2 {
            let panel = &panel;
            s.spawn(move || {
                for n in 0..200 {
                    let speed = ((n * 7 + i) % 101) as i64;
                    let result = match n % 4 {
                        0 => panel.drive_forward(Some(speed)).map(|_| ()),
                        1 => panel.drive_backward(Some(speed)).map(|_| ()),
                        2 => panel.set_motor_speed(speed).map(|_| ()),
                        _ => panel.stop_motor().map(|_| ()),
                    };
                    result.unwrap();
                }
            });
        }

        s.spawn(|| {
            for n in 0..200 {
                if n % 2 == 0 {
                    panel.disable_distance_sensor();
                } else {
                    panel.enable_distance_sensor();
                }
            }
        });

        for _ in 0..4 {
            let panel = &panel;
            s.spawn(move || {
                for _ in 0..500 {
                    let snap = panel.snapshot();
                    let motor = snap.motor;
                    assert!(motor.speed() <= 100);
                    assert_eq!(motor.is_running(), motor.direction().is_some());

                    let json = serde_json::to_value(&snap).unwrap();
                    let running = json["motor"]["is_running"].as_bool().unwrap();
                    let state = json["motor"]["state"].as_str().unwrap();
                    assert_eq!(running, state != "stopped");
                    assert_eq!(json["motor"]["direction"].is_null(), !running);

                    if !snap.sensor_enabled {
                        assert_eq!(snap.distance, DistanceReading::Disabled);
                    }
                }
            });
        }
    });

    panel.shutdown();
}

#[test]
fn test_distance_and_imu_published_as_a_pair() {
    let count = Arc::new(AtomicU32::new(0));
    let distance: Box<dyn DistanceSensor> = Box::new(CountingRanger {
        count: Arc::clone(&count),
    });
    let imu: Box<dyn InertialSensor> = Box::new(EchoImu {
        count: Arc::clone(&count),
    });
    let distance: SharedDistanceSensor = Arc::new(Mutex::new(distance));
    let imu: SharedInertialSensor = Arc::new(Mutex::new(imu));

    let state = create_shared_state();
    let config = PollerConfig {
        interval_ms: 1,
        ..Default::default()
    };
    let poller = SensorPoller::new(distance, imu, Arc::clone(&state), config);
    poller.start().unwrap();
    assert!(wait_for(Duration::from_secs(2), || state.snapshot().poll_cycles > 0));

    thread::scope(|s| {
        for _ in 0..4 {
            let state = &state;
            s.spawn(move || {
                for _ in 0..2000 {
                    let snap = state.snapshot();
                    if let DistanceReading::Measured(cm) = snap.distance {
                        assert_eq!(cm, snap.imu.gyro_x);
                    }
                }
            });
        }
    });

    poller.stop();
    let snap = state.snapshot();
    assert!(matches!(snap.distance, DistanceReading::Measured(cm) if cm == snap.imu.gyro_x));
}

#[test]
fn test_calibration_does_not_stall_polling() {
    let panel = simulated_panel(&test_config(5));
    panel.start_polling().unwrap();
    assert!(wait_for(Duration::from_secs(2), || panel.snapshot().poll_cycles > 0));

    thread::scope(|s| {
        let calibration = s.spawn(|| panel.calibrate_imu(100));

        thread::sleep(Duration::from_millis(100));
        let before = panel.snapshot().poll_cycles;
        thread::sleep(Duration::from_millis(300));
        let after = panel.snapshot().poll_cycles;

        assert!(!calibration.is_finished(), "calibration finished too early");
        assert!(after >= before + 10, "poller stalled: {} -> {}", before, after);

        let cal = calibration.join().unwrap().unwrap();
        assert_eq!(cal.samples, 100);
    });

    panel.shutdown();
}
