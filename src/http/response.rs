//! JSON responses
//!
//! Every response is `application/json` and closes the connection.

use crate::error::Error;
use serde::Serialize;
use serde_json::{Value, json};
use std::io::{self, Write};

/// A response ready to be written
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    /// Serialize `value` as the body
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                log::error!("Failed to encode response: {}", e);
                Self::error(500, "Failed to encode response")
            }
        }
    }

    pub fn ok<T: Serialize>(value: &T) -> Self {
        Self::json(200, value)
    }

    /// `{"success": true, "message": ..}` merged with the fields in `extra`
    pub fn success(message: impl Into<String>, extra: Value) -> Self {
        let mut body = json!({
            "success": true,
            "message": message.into(),
        });
        if let (Some(map), Value::Object(extra)) = (body.as_object_mut(), extra) {
            map.extend(extra);
        }
        Self::json(200, &body)
    }

    /// `{"success": false, "message": ..}`
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = json!({
            "success": false,
            "message": message.into(),
        });
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Map a failed command to its status code
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::PayloadTooLarge { .. } => Self::error(413, err.to_string()),
            e if e.is_client_error() => Self::error(400, e.to_string()),
            e => {
                log::error!("Command failed: {}", e);
                Self::error(500, e.to_string())
            }
        }
    }

    /// Write status line, headers and body
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            reason_phrase(self.status),
            self.body.len()
        )?;
        writer.write_all(&self.body)?;
        writer.flush()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
