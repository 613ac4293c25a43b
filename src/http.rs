//! Hand-rolled HTTP/1.1 client for bulk transfer (spec §4.7).
//!
//! A TLS-capable client with keep-alive and byte-range support — not a
//! general browser HTTP stack, so no chunked transfer decoding, no cookies,
//! no redirect following: only what the server contract in use requires
//! (spec §6 "HTTP").

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use crate::error::{Categorize, Category};
use crate::tls::{Signal, TlsProvider, TlsSocket};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connect failed: {0}")]
    Connect(#[source] crate::tls::TlsError),
    #[error("no candidate host accepted the connection")]
    AllHostsFailed,
    #[error("malformed response headers")]
    MalformedHeaders,
    #[error("socket I/O failure")]
    Io,
}

impl HttpError {
    pub fn category(&self) -> Category {
        match self {
            HttpError::Connect(_) | HttpError::AllHostsFailed | HttpError::Io => Category::TempFail,
            HttpError::MalformedHeaders => Category::PermFail,
        }
    }
}

impl Categorize for HttpError {
    fn category(&self) -> Category {
        HttpError::category(self)
    }
}

const READ_BUF_SIZE: usize = 8192;

/// Exactly the struct in spec §3 "HTTP socket": underlying TLS socket, a
/// read buffer, the declared content length of the current response body
/// (-1 = until close), bytes already consumed, a keep-alive flag, and an
/// owned cache key (the original's trailing flexible-array member becomes
/// a plain `String` field here, per §9).
pub struct HttpSocket<P: TlsProvider> {
    socket: TlsSocket<P>,
    read_buf: Vec<u8>,
    buf_offset: usize,
    buf_filled: usize,
    content_length: i64,
    bytes_consumed: u64,
    keep_alive: bool,
    cache_key: String,
}

impl<P: TlsProvider> HttpSocket<P> {
    /// Fills the read buffer with at least one more byte, or reports genuine
    /// socket EOF as `Ok(0)`. Busy-loops on `WantRead`/`WantWrite` rather
    /// than surfacing them as `Ok(0)` — the next body bytes not having
    /// arrived yet is not the same as the connection being closed, and
    /// callers (`readall` in particular) rely on that distinction to avoid
    /// reporting a short read before `Content-Length` is actually exhausted.
    fn fill_buffer(&mut self) -> Result<usize, HttpError> {
        if self.buf_offset == self.buf_filled {
            self.buf_offset = 0;
            self.buf_filled = 0;
        }
        loop {
            match self.socket.read(&mut self.read_buf[self.buf_filled..]) {
                Signal::Ok(n) => {
                    self.buf_filled += n;
                    return Ok(n);
                }
                Signal::WantRead | Signal::WantWrite => continue,
                Signal::Fail => return Err(HttpError::Io),
            }
        }
    }

    fn read_line(&mut self) -> Result<String, HttpError> {
        loop {
            if let Some(pos) = self.read_buf[self.buf_offset..self.buf_filled]
                .windows(2)
                .position(|w| w == b"\r\n")
            {
                let end = self.buf_offset + pos;
                let line = String::from_utf8_lossy(&self.read_buf[self.buf_offset..end]).into_owned();
                self.buf_offset = end + 2;
                return Ok(line);
            }
            if self.buf_filled == self.read_buf.len() {
                return Err(HttpError::MalformedHeaders);
            }
            if self.fill_buffer()? == 0 {
                return Err(HttpError::MalformedHeaders);
            }
        }
    }

    fn parse_response_headers(&mut self) -> Result<(), HttpError> {
        let status_line = self.read_line()?;
        if !status_line.starts_with("HTTP/1.") {
            return Err(HttpError::MalformedHeaders);
        }
        self.content_length = -1;
        self.keep_alive = true;
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            match name.as_str() {
                "content-length" => {
                    self.content_length = value.parse().unwrap_or(-1);
                }
                "connection" => {
                    self.keep_alive = !value.eq_ignore_ascii_case("close");
                }
                _ => {}
            }
        }
        self.bytes_consumed = 0;
        Ok(())
    }

    /// Reads exactly `buf.len()` bytes of body, spanning buffered data and
    /// the underlying stream; returns fewer only at body end.
    pub fn readall(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        let remaining_in_body = if self.content_length < 0 {
            u64::MAX
        } else {
            (self.content_length as u64).saturating_sub(self.bytes_consumed)
        };
        let want = (buf.len() as u64).min(remaining_in_body) as usize;
        let mut total = 0usize;
        while total < want {
            if self.buf_offset < self.buf_filled {
                let avail = self.buf_filled - self.buf_offset;
                let n = avail.min(want - total);
                buf[total..total + n]
                    .copy_from_slice(&self.read_buf[self.buf_offset..self.buf_offset + n]);
                self.buf_offset += n;
                total += n;
                self.bytes_consumed += n as u64;
                continue;
            }
            if self.fill_buffer()? == 0 && self.buf_offset == self.buf_filled {
                break;
            }
        }
        Ok(total)
    }

    pub fn request_readall(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        self.readall(buf)
    }

    /// Drains any unread bytes of the previous response body so the
    /// connection can be reused for another request.
    pub fn next_request(&mut self) -> Result<(), HttpError> {
        let mut sink = [0u8; 4096];
        loop {
            let n = self.readall(&mut sink)?;
            if n == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Returns the connection to the host cache if keep-alive is armed and
    /// the body is fully drained; otherwise the socket is torn down.
    pub fn close(self, cache: &HostCache<P>) {
        let fully_drained = self.content_length < 0
            || self.bytes_consumed >= self.content_length as u64;
        if self.keep_alive && fully_drained {
            cache.put(self.cache_key.clone(), self);
        }
    }
}

fn build_request(host: &str, path: &str, from: u64, to: u64, extra_headers: Option<&str>) -> Vec<u8> {
    let mut req = format!("GET {path} HTTP/1.1\r\nHost: {host}\r\n");
    if to > from {
        req.push_str(&format!("Range: bytes={from}-{to}\r\n"));
    }
    if let Some(extra) = extra_headers {
        req.push_str(extra);
        if !extra.ends_with("\r\n") {
            req.push_str("\r\n");
        }
    }
    req.push_str("\r\n");
    req.into_bytes()
}

/// Per-host idle-connection cache backing `connect`'s reuse path.
pub struct HostCache<P: TlsProvider> {
    idle: Mutex<HashMap<String, Vec<HttpSocket<P>>>>,
}

impl<P: TlsProvider> Default for HostCache<P> {
    fn default() -> Self {
        HostCache { idle: Mutex::new(HashMap::new()) }
    }
}

impl<P: TlsProvider> HostCache<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: String, socket: HttpSocket<P>) {
        self.idle.lock().entry(key).or_default().push(socket);
    }

    pub fn take(&self, key: &str) -> Option<HttpSocket<P>> {
        self.idle.lock().get_mut(key).and_then(Vec::pop)
    }
}

/// Opens (or reuses from `cache`) one connection to `host` and issues a
/// `GET` with `Range: bytes=from-to` when `to > from`.
pub fn connect<P: TlsProvider>(
    addr: SocketAddr,
    host: &str,
    path: &str,
    from: u64,
    to: u64,
    extra_headers: Option<&str>,
    cache: &HostCache<P>,
) -> Result<HttpSocket<P>, HttpError> {
    if let Some(mut reused) = cache.take(host) {
        if request(&mut reused, host, path, from, to, extra_headers).is_ok() {
            return Ok(reused);
        }
    }
    let tls = TlsSocket::connect(addr, host, Duration::from_secs(10)).map_err(HttpError::Connect)?;
    let mut socket = HttpSocket {
        socket: tls,
        read_buf: vec![0u8; READ_BUF_SIZE],
        buf_offset: 0,
        buf_filled: 0,
        content_length: -1,
        bytes_consumed: 0,
        keep_alive: true,
        cache_key: host.to_string(),
    };
    request(&mut socket, host, path, from, to, extra_headers)?;
    Ok(socket)
}

/// Tries each candidate address in turn until one connects successfully.
pub fn connect_multihost<P: TlsProvider>(
    hosts: &[(SocketAddr, &str)],
    path: &str,
    from: u64,
    to: u64,
    cache: &HostCache<P>,
) -> Result<(HttpSocket<P>, String), HttpError> {
    for (addr, host) in hosts {
        if let Ok(socket) = connect(*addr, host, path, from, to, None, cache) {
            return Ok((socket, host.to_string()));
        }
    }
    Err(HttpError::AllHostsFailed)
}

/// Warms up a connection to `host` and stashes it in `cache`; failures are
/// non-fatal, matching the original's fire-and-forget semantics.
pub fn connect_and_cache_host<P: TlsProvider>(addr: SocketAddr, host: &str, cache: &HostCache<P>) {
    if let Ok(tls) = TlsSocket::connect(addr, host, Duration::from_secs(10)) {
        cache.put(
            host.to_string(),
            HttpSocket {
                socket: tls,
                read_buf: vec![0u8; READ_BUF_SIZE],
                buf_offset: 0,
                buf_filled: 0,
                content_length: -1,
                bytes_consumed: 0,
                keep_alive: true,
                cache_key: host.to_string(),
            },
        );
    }
}

/// Reuses `socket` for a subsequent request, draining any unread body first.
pub fn request<P: TlsProvider>(
    socket: &mut HttpSocket<P>,
    host: &str,
    path: &str,
    from: u64,
    to: u64,
    extra_headers: Option<&str>,
) -> Result<(), HttpError> {
    let req = build_request(host, path, from, to, extra_headers);
    write_all(socket, &req)?;
    socket.parse_response_headers()
}

pub fn request_range_additional<P: TlsProvider>(
    socket: &mut HttpSocket<P>,
    host: &str,
    path: &str,
    from: u64,
    to: u64,
    extra_headers: Option<&str>,
) -> Result<(), HttpError> {
    socket.next_request()?;
    request(socket, host, path, from, to, extra_headers)
}

fn write_all<P: TlsProvider>(socket: &mut HttpSocket<P>, mut buf: &[u8]) -> Result<(), HttpError> {
    while !buf.is_empty() {
        match socket.socket.write(buf) {
            Signal::Ok(0) => return Err(HttpError::Io),
            Signal::Ok(n) => buf = &buf[n..],
            Signal::WantRead | Signal::WantWrite => continue,
            Signal::Fail => return Err(HttpError::Io),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_request_is_built_exactly() {
        let req = build_request("d.example", "/f", 100, 199, None);
        let text = String::from_utf8(req).unwrap();
        assert!(text.starts_with("GET /f HTTP/1.1\r\n"));
        assert!(text.contains("Host: d.example\r\n"));
        assert!(text.contains("Range: bytes=100-199\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn no_range_header_when_to_not_greater_than_from() {
        let req = build_request("d.example", "/f", 0, 0, None);
        let text = String::from_utf8(req).unwrap();
        assert!(!text.contains("Range:"));
    }

    #[test]
    fn extra_headers_are_appended() {
        let req = build_request("h", "/p", 0, 0, Some("X-Custom: 1"));
        let text = String::from_utf8(req).unwrap();
        assert!(text.contains("X-Custom: 1\r\n"));
    }
}
