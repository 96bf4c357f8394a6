//! Command/query façade properties

use super::harness::{simulated_panel, test_config};
use yantra_io::Error;
use yantra_io::core::types::{MotorState, MotorStatus};

#[test]
fn test_servo_angle_in_range_is_reported() {
    let panel = simulated_panel(&test_config(300));
    for angle in [0, 1, 45, 90, 179, 180] {
        assert_eq!(panel.set_servo_angle(angle).unwrap() as i64, angle);
        assert_eq!(panel.snapshot().servo_angle as i64, angle);
    }
}

#[test]
fn test_servo_angle_out_of_range_leaves_state() {
    let panel = simulated_panel(&test_config(300));
    panel.set_servo_angle(30).unwrap();
    for angle in [-1, 181, 1000, i64::MIN, i64::MAX] {
        let err = panel.set_servo_angle(angle).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{:?}", err);
        assert_eq!(panel.snapshot().servo_angle, 30);
    }
}

#[test]
fn test_forward_then_stop() {
    let panel = simulated_panel(&test_config(300));
    for speed in [0, 50, 100] {
        let status = panel.drive_forward(Some(speed)).unwrap();
        assert_eq!(status.state(), MotorState::Forward);
        assert!(status.is_running());
        assert_eq!(status.speed() as i64, speed);
        assert_eq!(panel.snapshot().motor, status);
    }

    let stopped = panel.stop_motor().unwrap();
    assert_eq!(stopped.state(), MotorState::Stopped);
    assert_eq!(stopped.speed(), 0);
    assert!(!stopped.is_running());
    assert_eq!(stopped.direction(), None);
}

#[test]
fn test_stop_is_idempotent() {
    let panel = simulated_panel(&test_config(300));
    panel.drive_backward(Some(30)).unwrap();
    let first = panel.stop_motor().unwrap();
    let second = panel.stop_motor().unwrap();
    assert_eq!(first, second);
    assert_eq!(second, MotorStatus::stopped());
}

#[test]
fn test_invalid_speed_leaves_motor() {
    let panel = simulated_panel(&test_config(300));
    panel.drive_forward(Some(40)).unwrap();
    assert!(panel.drive_backward(Some(-1)).is_err());
    assert!(panel.set_motor_speed(101).is_err());
    let status = panel.motor_status();
    assert_eq!(status.state(), MotorState::Forward);
    assert_eq!(status.speed(), 40);
}

#[test]
fn test_disable_forces_zero_distance() {
    let panel = simulated_panel(&test_config(300));
    assert!(!panel.disable_distance_sensor());
    let snap = panel.snapshot();
    assert_eq!(snap.distance.as_cm(), 0.0);
    assert!(!snap.sensor_enabled);
    assert!(panel.enable_distance_sensor());
}

#[test]
fn test_shutdown_halts_motor_and_poller() {
    let panel = simulated_panel(&test_config(20));
    assert!(panel.start_polling().unwrap());
    panel.drive_backward(Some(80)).unwrap();

    panel.shutdown();

    assert!(!panel.is_polling());
    assert_eq!(panel.motor_status(), MotorStatus::stopped());
}
