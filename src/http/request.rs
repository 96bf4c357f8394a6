//! HTTP/1.1 request parsing
//!
//! ```text
//! POST /api/servo/move HTTP/1.1\r\n      <- request line
//! Host: pi.local:5000\r\n                <- headers (case-insensitive names)
//! Content-Type: application/json\r\n
//! Content-Length: 13\r\n
//! \r\n
//! {"angle": 45}                          <- body, exactly Content-Length bytes
//! ```
//!
//! Only what the control API needs: one request per connection, bodies sized
//! by `Content-Length` (no chunked encoding).

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::io::{BufRead, Read};

/// Longest accepted request or header line
const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Most headers accepted in one request
const MAX_HEADERS: usize = 64;

/// A parsed request
#[derive(Debug, Clone)]
pub struct Request {
    /// Upper-case method (`GET`, `POST`, ...)
    pub method: String,
    /// Path without the query string
    pub path: String,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as a JSON object.
    ///
    /// An empty body, invalid JSON or a non-object value all yield `None`, so
    /// handlers treat them the same as "no body".
    pub fn json_object(&self) -> Option<Map<String, Value>> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Ignoring unparseable JSON body: {}", e);
                None
            }
        }
    }
}

/// Read a line of at most `MAX_LINE_BYTES`, without the trailing CRLF.
/// Returns `None` on EOF before any byte.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut raw = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE_BYTES)
        .read_until(b'\n', &mut raw)?;
    if n == 0 {
        return Ok(None);
    }
    if raw.last() != Some(&b'\n') {
        return Err(Error::Http("Line too long or truncated".into()));
    }
    while matches!(raw.last(), Some(b'\n' | b'\r')) {
        raw.pop();
    }
    String::from_utf8(raw)
        .map(Some)
        .map_err(|_| Error::Http("Request line is not UTF-8".into()))
}

/// Read one request from `reader`.
///
/// Returns `Ok(None)` when the peer closed the connection without sending
/// anything.
pub fn read_request<R: BufRead>(reader: &mut R, max_body_bytes: usize) -> Result<Option<Request>> {
    let Some(request_line) = read_line(reader)? else {
        return Ok(None);
    };

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::Http(format!("Malformed request line: {:?}", request_line)));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(Error::Http(format!("Unsupported protocol: {}", version)));
    }

    let path = target.split('?').next().unwrap_or(target).to_string();
    let method = method.to_ascii_uppercase();

    let mut headers = Vec::new();
    loop {
        let line = read_line(reader)?.ok_or_else(|| Error::Http("Unexpected end of headers".into()))?;
        if line.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(Error::Http("Too many headers".into()));
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::Http(format!("Malformed header: {:?}", line)))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let mut request = Request {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    if request
        .header("transfer-encoding")
        .is_some_and(|v| !v.eq_ignore_ascii_case("identity"))
    {
        return Err(Error::Http("Chunked request bodies are not supported".into()));
    }

    let length = match request.header("content-length") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| Error::Http(format!("Invalid Content-Length: {:?}", v)))?,
        None => 0,
    };
    if length > max_body_bytes {
        return Err(Error::PayloadTooLarge {
            size: length,
            limit: max_body_bytes,
        });
    }
    if length > 0 {
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;
        request.body = body;
    }

    Ok(Some(request))
}

/// Interpret a JSON value as an integer.
///
/// Accepts integers, floats (truncated toward zero) and strings holding an
/// integer. Booleans, null, arrays and objects are rejected.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Optional integer field: absent → `Ok(None)`, present but not an integer →
/// `InvalidArgument`.
pub fn optional_int(body: Option<&Map<String, Value>>, field: &str, label: &str) -> Result<Option<i64>> {
    match body.and_then(|b| b.get(field)) {
        None => Ok(None),
        Some(value) => parse_int(value)
            .map(Some)
            .ok_or_else(|| Error::InvalidArgument(format!("Invalid {} value", label))),
    }
}

/// Required integer field
pub fn required_int(body: Option<&Map<String, Value>>, field: &str, label: &str) -> Result<i64> {
    optional_int(body, field, label)?
        .ok_or_else(|| Error::InvalidArgument(format!("{} is required", capitalize(label))))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
