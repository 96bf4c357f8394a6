//! End-to-end HTTP tests against a server on 127.0.0.1

use super::harness::{TestServer, format_request, parse_response, send_raw, simulated_panel, test_config};
use std::sync::Arc;

fn server() -> TestServer {
    let config = test_config(300);
    let panel = simulated_panel(&config);
    TestServer::start(Arc::clone(&panel), &config)
}

#[test]
fn test_servo_move_then_out_of_range() {
    let server = server();

    let (status, body) = server.request("POST", "/api/servo/move", Some(r#"{"angle": 90}"#));
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["angle"], 90);

    let (status, body) = server.request("POST", "/api/servo/move", Some(r#"{"angle": 200}"#));
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("between 0 and 180"));

    let (_, data) = server.request("GET", "/api/data", None);
    assert_eq!(data["servo_angle"], 90);
}

#[test]
fn test_forward_and_motor_status() {
    let server = server();

    let (status, body) = server.request("POST", "/api/motor/forward", Some(r#"{"speed": 75}"#));
    assert_eq!(status, 200);
    assert_eq!(body["motor"]["state"], "forward");
    assert_eq!(body["motor"]["speed"], 75);
    assert_eq!(body["motor"]["is_running"], true);

    let (status, body) = server.request("POST", "/api/motor/speed", Some(r#"{"speed": "30"}"#));
    assert_eq!(status, 200);
    assert_eq!(body["speed"], 30);

    let (status, motor) = server.request("GET", "/api/motor/status", None);
    assert_eq!(status, 200);
    assert_eq!(motor["state"], "forward");
    assert_eq!(motor["speed"], 30);

    let (status, body) = server.request("POST", "/api/motor/brake", None);
    assert_eq!(status, 200);
    assert_eq!(body["motor"]["state"], "stopped");
    assert!(body["motor"]["direction"].is_null());
}

#[test]
fn test_sensor_off_shows_zero_distance() {
    let server = server();

    let (status, body) = server.request("POST", "/api/sensor/off", None);
    assert_eq!(status, 200);
    assert_eq!(body["sensor_active"], false);

    let (status, data) = server.request("GET", "/api/data", None);
    assert_eq!(status, 200);
    assert_eq!(data["distance"], 0.0);
    assert_eq!(data["distance_status"], "disabled");
    assert_eq!(data["sensor_active"], false);

    let (_, body) = server.request("POST", "/api/sensor/on", None);
    assert_eq!(body["sensor_active"], true);
}

#[test]
fn test_error_statuses() {
    let server = server();

    let (status, body) = server.request("GET", "/api/unknown", None);
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = server.request("GET", "/api/servo/move", None);
    assert_eq!(status, 405);

    let raw = send_raw(server.addr, "NONSENSE\r\n\r\n");
    let (status, _) = parse_response(&raw);
    assert_eq!(status, 400);

    let raw = send_raw(
        server.addr,
        "POST /api/servo/move HTTP/1.1\r\nContent-Length: 999999999\r\n\r\n",
    );
    let (status, _) = parse_response(&raw);
    assert_eq!(status, 413);
}

#[test]
fn test_status_reports_backends_and_pins() {
    let server = server();
    let (status, body) = server.request("GET", "/api/status", None);
    assert_eq!(status, 200);
    assert_eq!(body["rpi_available"], false);
    assert_eq!(body["sensor_thread_running"], false);
    assert_eq!(body["backends"]["distance"], "simulated");
    assert_eq!(body["gpio_pins"]["servo"], 18);
    assert_eq!(body["gpio_pins"]["echo"], 24);
}

#[test]
fn test_concurrent_clients() {
    let server = server();
    let addr = server.addr;

    std::thread::scope(|s| {
        for i in 0..8 {
            s.spawn(move || {
                let body = format!(r#"{{"angle": {}}}"#, i * 20);
                let raw = send_raw(addr, &format_request("POST", "/api/servo/move", Some(&body)));
                let (status, json) = parse_response(&raw);
                assert_eq!(status, 200);
                assert_eq!(json["angle"], i * 20);
            });
        }
    });

    let (_, data) = server.request("GET", "/api/data", None);
    let angle = data["servo_angle"].as_i64().unwrap();
    assert!(angle % 20 == 0 && angle <= 140);
}
