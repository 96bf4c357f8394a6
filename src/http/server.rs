//! HTTP accept loop
//!
//! ```text
//! 1. Listener is non-blocking; the loop polls the shutdown flag between
//!    accepts and backs off 10ms when nothing is pending
//! 2. Each accepted socket goes back to blocking mode with a read timeout
//! 3. A named handler thread reads one request, dispatches it against the
//!    shared ControlPanel, writes the response and closes
//! ```

use super::request::read_request;
use super::response::Response;
use super::routes::dispatch;
use crate::config::ServerConfig;
use crate::control::ControlPanel;
use crate::error::{Error, Result};
use std::io::{BufReader, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Back-off when no connection is pending
const ACCEPT_IDLE: Duration = Duration::from_millis(10);

/// HTTP server bound to a socket
pub struct HttpServer {
    listener: TcpListener,
    panel: Arc<ControlPanel>,
    config: ServerConfig,
}

impl HttpServer {
    /// Bind `config.bind_address`
    pub fn bind(config: ServerConfig, panel: Arc<ControlPanel>) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_address).map_err(|e| {
            Error::Other(format!("Failed to bind to {}: {}", config.bind_address, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            panel,
            config,
        })
    }

    /// Actual bound address (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `running` is cleared
    pub fn run(&self, running: Arc<AtomicBool>) -> Result<()> {
        log::info!("HTTP server listening on {}", self.local_addr()?);

        let connection_ids = AtomicU64::new(0);

        while running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let id = connection_ids.fetch_add(1, Ordering::Relaxed);
                    let panel = Arc::clone(&self.panel);
                    let config = self.config.clone();

                    let spawned = thread::Builder::new()
                        .name(format!("http-{}", id))
                        .spawn(move || handle_connection(stream, addr, &panel, &config));
                    if let Err(e) = spawned {
                        log::error!("Failed to spawn handler for {}: {}", addr, e);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_IDLE);
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                }
            }
        }

        log::info!("HTTP server stopped");
        Ok(())
    }
}

/// Serve a single request on `stream`
fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    panel: &ControlPanel,
    config: &ServerConfig,
) {
    if let Err(e) = stream.set_nonblocking(false) {
        log::warn!("Failed to set blocking mode for {}: {}", addr, e);
        return;
    }
    if let Err(e) = stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms))) {
        log::warn!("Failed to set read timeout: {}", e);
    }

    let mut writer = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Failed to clone stream for {}: {}", addr, e);
            return;
        }
    };
    let mut reader = BufReader::new(stream);

    let response = match read_request(&mut reader, config.max_body_bytes) {
        Ok(Some(request)) => {
            log::debug!("{} {} from {}", request.method, request.path, addr);
            dispatch(panel, &request)
        }
        Ok(None) => return,
        Err(Error::Io(ref e))
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            Response::error(408, "Timed out reading request")
        }
        Err(Error::Io(e)) => {
            log::debug!("Connection from {} dropped: {}", addr, e);
            return;
        }
        Err(e) => {
            log::debug!("Rejected request from {}: {}", addr, e);
            Response::from_error(&e)
        }
    };

    log::trace!("{} -> {}", addr, response.status);
    if let Err(e) = response.write_to(&mut writer) {
        log::debug!("Failed to write response to {}: {}", addr, e);
    }
    let _ = writer.shutdown(Shutdown::Write);
}
