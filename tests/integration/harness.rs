//! Shared setup: simulated control panel, background HTTP server, raw client

use serde_json::Value;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use yantra_io::config::Config;
use yantra_io::devices::DeviceSet;
use yantra_io::http::HttpServer;
use yantra_io::state::create_shared_state;
use yantra_io::ControlPanel;

/// Simulated config with a fast poll interval
pub fn test_config(interval_ms: u64) -> Config {
    let mut config = Config::simulated();
    config.poller.interval_ms = interval_ms;
    config.server.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Control panel over simulated devices; poller not started
pub fn simulated_panel(config: &Config) -> Arc<ControlPanel> {
    Arc::new(ControlPanel::new(
        DeviceSet::simulated(config),
        create_shared_state(),
        config,
    ))
}

/// HTTP server running on an ephemeral port; stops when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start(panel: Arc<ControlPanel>, config: &Config) -> Self {
        let server = HttpServer::bind(config.server.clone(), panel).unwrap();
        let addr = server.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let r = Arc::clone(&running);
        let handle = thread::spawn(move || server.run(r).unwrap());
        Self {
            addr,
            running,
            handle: Some(handle),
        }
    }

    /// Send one request, return status code and JSON body
    pub fn request(&self, method: &str, path: &str, body: Option<&str>) -> (u16, Value) {
        let raw = send_raw(self.addr, &format_request(method, path, body));
        parse_response(&raw)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn format_request(method: &str, path: &str, body: Option<&str>) -> String {
    let body = body.unwrap_or("");
    format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        path,
        body.len(),
        body
    )
}

/// Write `request` verbatim and read until the server closes
pub fn send_raw(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

/// Split a raw response into status code and JSON body
pub fn parse_response(raw: &str) -> (u16, Value) {
    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("no status line in {:?}", raw));
    let (_, body) = raw
        .split_once("\r\n\r\n")
        .unwrap_or_else(|| panic!("no header terminator in {:?}", raw));
    (status, serde_json::from_str(body).unwrap())
}
