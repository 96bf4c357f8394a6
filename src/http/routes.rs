//! API route table
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | GET  | `/api/data` | |
//! | POST | `/api/sensor/on`, `/api/sensor/off` | |
//! | GET  | `/api/sensor/status` | |
//! | POST | `/api/servo/move` | `{"angle"}` |
//! | POST | `/api/servo/preset` | `{"position"}` |
//! | POST | `/api/servo/sweep` | `{"start"?, "end"?, "step"?, "delay_ms"?}` |
//! | GET  | `/api/servo/button` | |
//! | POST | `/api/motor/forward`, `/api/motor/backward` | `{"speed"?}` |
//! | POST | `/api/motor/stop`, `/api/motor/brake` | |
//! | POST | `/api/motor/speed` | `{"speed"}` |
//! | GET  | `/api/motor/status` | |
//! | POST | `/api/imu/calibrate` | `{"samples"?}` |
//! | GET  | `/api/status` | |

use super::request::{Request, optional_int, required_int};
use super::response::Response;
use crate::control::{ControlPanel, SweepRequest};
use crate::core::types::ServoPreset;
use crate::error::{Error, Result};
use serde_json::{Map, Value, json};

type Handler = fn(&ControlPanel, &Request) -> Result<Response>;

struct Route {
    method: &'static str,
    path: &'static str,
    handler: Handler,
}

const fn route(method: &'static str, path: &'static str, handler: Handler) -> Route {
    Route {
        method,
        path,
        handler,
    }
}

const ROUTES: &[Route] = &[
    route("GET", "/", index),
    route("GET", "/api/data", get_data),
    route("POST", "/api/sensor/on", sensor_on),
    route("POST", "/api/sensor/off", sensor_off),
    route("GET", "/api/sensor/status", sensor_status),
    route("POST", "/api/servo/move", servo_move),
    route("POST", "/api/servo/preset", servo_preset),
    route("POST", "/api/servo/sweep", servo_sweep),
    route("GET", "/api/servo/button", servo_button),
    route("POST", "/api/motor/forward", motor_forward),
    route("POST", "/api/motor/backward", motor_backward),
    route("POST", "/api/motor/stop", motor_stop),
    route("POST", "/api/motor/brake", motor_brake),
    route("POST", "/api/motor/speed", motor_speed),
    route("GET", "/api/motor/status", motor_status),
    route("POST", "/api/imu/calibrate", imu_calibrate),
    route("GET", "/api/status", system_status),
];

/// Samples averaged by `/api/imu/calibrate` when the body names none
const DEFAULT_CALIBRATION_SAMPLES: i64 = 100;

/// Dispatch a request to its handler
pub fn dispatch(panel: &ControlPanel, request: &Request) -> Response {
    let mut path_known = false;
    for route in ROUTES.iter().filter(|r| r.path == request.path) {
        path_known = true;
        if route.method == request.method {
            return (route.handler)(panel, request).unwrap_or_else(|e| Response::from_error(&e));
        }
    }

    if path_known {
        Response::error(405, format!("Method {} not allowed", request.method))
    } else {
        Response::error(404, format!("No route for {}", request.path))
    }
}

fn index(_: &ControlPanel, _: &Request) -> Result<Response> {
    let endpoints: Vec<String> = ROUTES
        .iter()
        .filter(|r| r.path != "/")
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    Ok(Response::ok(&json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    })))
}

fn get_data(panel: &ControlPanel, _: &Request) -> Result<Response> {
    Ok(Response::ok(&panel.snapshot()))
}

fn sensor_on(panel: &ControlPanel, _: &Request) -> Result<Response> {
    let active = panel.enable_distance_sensor();
    Ok(Response::success(
        "Distance sensor enabled",
        json!({ "sensor_active": active }),
    ))
}

fn sensor_off(panel: &ControlPanel, _: &Request) -> Result<Response> {
    let active = panel.disable_distance_sensor();
    Ok(Response::success(
        "Distance sensor disabled",
        json!({ "sensor_active": active }),
    ))
}

fn sensor_status(panel: &ControlPanel, _: &Request) -> Result<Response> {
    Ok(Response::ok(&panel.sensor_status()))
}

fn servo_move(panel: &ControlPanel, request: &Request) -> Result<Response> {
    let body = request.json_object();
    let angle = required_int(body.as_ref(), "angle", "angle")?;
    let realized = panel.set_servo_angle(angle)?;
    Ok(Response::success(
        format!("Servo moved to {}°", realized),
        json!({ "angle": realized }),
    ))
}

fn servo_preset(panel: &ControlPanel, request: &Request) -> Result<Response> {
    let body = request.json_object();
    let preset: ServoPreset = body
        .as_ref()
        .and_then(|b| b.get("position"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArgument("Position is required".into()))?
        .parse()?;
    let realized = panel.move_servo_to_preset(preset)?;
    Ok(Response::success(
        format!("Servo moved to {}°", realized),
        json!({ "angle": realized }),
    ))
}

fn servo_sweep(panel: &ControlPanel, request: &Request) -> Result<Response> {
    let body = request.json_object();
    let body = body.as_ref();
    let defaults = SweepRequest::default();
    let sweep = SweepRequest {
        start: optional_int(body, "start", "start")?.unwrap_or(defaults.start),
        end: optional_int(body, "end", "end")?.unwrap_or(defaults.end),
        step: optional_int(body, "step", "step")?.unwrap_or(defaults.step),
        delay_ms: optional_int(body, "delay_ms", "delay")?.unwrap_or(defaults.delay_ms),
    };
    let realized = panel.sweep_servo(sweep)?;
    Ok(Response::success(
        format!("Servo swept from {}° to {}°", sweep.start, sweep.end),
        json!({ "angle": realized }),
    ))
}

fn servo_button(panel: &ControlPanel, _: &Request) -> Result<Response> {
    Ok(Response::ok(&json!({ "pressed": panel.servo_button_pressed() })))
}

/// Speed for forward/backward: a missing or unparseable body means "default"
fn drive_speed(request: &Request) -> Result<Option<i64>> {
    let body: Option<Map<String, Value>> = request.json_object();
    optional_int(body.as_ref(), "speed", "speed")
}

fn motor_forward(panel: &ControlPanel, request: &Request) -> Result<Response> {
    let status = panel.drive_forward(drive_speed(request)?)?;
    Ok(Response::success(
        format!("Motor moving forward (speed: {}%)", status.speed()),
        json!({ "motor": status }),
    ))
}

fn motor_backward(panel: &ControlPanel, request: &Request) -> Result<Response> {
    let status = panel.drive_backward(drive_speed(request)?)?;
    Ok(Response::success(
        format!("Motor moving backward (speed: {}%)", status.speed()),
        json!({ "motor": status }),
    ))
}

fn motor_stop(panel: &ControlPanel, _: &Request) -> Result<Response> {
    let status = panel.stop_motor()?;
    Ok(Response::success("Motor stopped", json!({ "motor": status })))
}

fn motor_brake(panel: &ControlPanel, _: &Request) -> Result<Response> {
    let status = panel.brake_motor()?;
    Ok(Response::success("Motor braked", json!({ "motor": status })))
}

fn motor_speed(panel: &ControlPanel, request: &Request) -> Result<Response> {
    let body = request.json_object();
    let speed = required_int(body.as_ref(), "speed", "speed")?;
    let applied = panel.set_motor_speed(speed)?;
    Ok(Response::success(
        format!("Motor speed set to {}%", applied),
        json!({ "speed": applied }),
    ))
}

fn motor_status(panel: &ControlPanel, _: &Request) -> Result<Response> {
    Ok(Response::ok(&panel.motor_status()))
}

fn imu_calibrate(panel: &ControlPanel, request: &Request) -> Result<Response> {
    let body = request.json_object();
    let samples =
        optional_int(body.as_ref(), "samples", "samples")?.unwrap_or(DEFAULT_CALIBRATION_SAMPLES);
    let calibration = panel.calibrate_imu(samples)?;
    Ok(Response::success(
        format!("IMU calibrated over {} samples", calibration.samples),
        json!({ "calibration": calibration }),
    ))
}

fn system_status(panel: &ControlPanel, _: &Request) -> Result<Response> {
    Ok(Response::ok(&panel.system_status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::devices::DeviceSet;
    use crate::http::request::read_request;
    use crate::state::create_shared_state;
    use std::io::Cursor;

    fn panel() -> ControlPanel {
        let config = Config::simulated();
        ControlPanel::new(DeviceSet::simulated(&config), create_shared_state(), &config)
    }

    fn call(panel: &ControlPanel, method: &str, path: &str, body: &str) -> (u16, Value) {
        let raw = format!(
            "{} {} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            method,
            path,
            body.len(),
            body
        );
        let request = read_request(&mut Cursor::new(raw.into_bytes()), 4096)
            .unwrap()
            .unwrap();
        let response = dispatch(panel, &request);
        let json = serde_json::from_slice(&response.body).unwrap();
        (response.status, json)
    }

    #[test]
    fn test_unknown_path_and_wrong_method() {
        let panel = panel();
        let (status, body) = call(&panel, "GET", "/api/nope", "");
        assert_eq!(status, 404);
        assert_eq!(body["success"], false);

        let (status, _) = call(&panel, "GET", "/api/motor/stop", "");
        assert_eq!(status, 405);
    }

    #[test]
    fn test_servo_move_validation() {
        let panel = panel();
        let (status, body) = call(&panel, "POST", "/api/servo/move", r#"{"angle": 120}"#);
        assert_eq!(status, 200);
        assert_eq!(body["angle"], 120);

        let (status, body) = call(&panel, "POST", "/api/servo/move", "");
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Angle is required");

        let (status, _) = call(&panel, "POST", "/api/servo/move", r#"{"angle": "left"}"#);
        assert_eq!(status, 400);

        let (status, _) = call(&panel, "POST", "/api/servo/move", r#"{"angle": 181}"#);
        assert_eq!(status, 400);
        assert_eq!(panel.snapshot().servo_angle, 120);
    }

    #[test]
    fn test_forward_with_invalid_body_uses_default() {
        let panel = panel();
        let (status, body) = call(&panel, "POST", "/api/motor/forward", "not json");
        assert_eq!(status, 200);
        assert_eq!(body["motor"]["speed"], 50);
        assert_eq!(body["motor"]["direction"], "forward");

        let (status, _) = call(&panel, "POST", "/api/motor/backward", r#"{"speed": 101}"#);
        assert_eq!(status, 400);
    }

    #[test]
    fn test_preset_and_button() {
        let panel = panel();
        let (status, body) = call(&panel, "POST", "/api/servo/preset", r#"{"position": "right"}"#);
        assert_eq!(status, 200);
        assert_eq!(body["angle"], 180);

        let (status, _) = call(&panel, "POST", "/api/servo/preset", r#"{"position": "up"}"#);
        assert_eq!(status, 400);

        let (status, body) = call(&panel, "GET", "/api/servo/button", "");
        assert_eq!(status, 200);
        assert_eq!(body["pressed"], false);
    }

    #[test]
    fn test_status_and_index() {
        let panel = panel();
        let (status, body) = call(&panel, "GET", "/api/status", "");
        assert_eq!(status, 200);
        assert_eq!(body["sensor_thread_running"], false);
        assert_eq!(body["backends"]["servo"], "simulated");
        assert_eq!(body["gpio_pins"]["motor_ena"], 21);

        let (status, body) = call(&panel, "GET", "/", "");
        assert_eq!(status, 200);
        assert!(
            body["endpoints"]
                .as_array()
                .unwrap()
                .contains(&json!("GET /api/data"))
        );
        assert!(
            !body["endpoints"]
                .as_array()
                .unwrap()
                .contains(&json!("GET /"))
        );
        assert_eq!(body["endpoints"].as_array().unwrap().len(), ROUTES.len() - 1);
    }

    #[test]
    fn test_calibrate_endpoint() {
        let panel = panel();
        let (status, body) = call(&panel, "POST", "/api/imu/calibrate", r#"{"samples": 3}"#);
        assert_eq!(status, 200);
        assert_eq!(body["calibration"]["samples"], 3);
    }
}
