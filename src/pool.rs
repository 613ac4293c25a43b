//! API connection pool (spec §4.6; `pnetlibs.h: psync_apipool_*`).
//!
//! A bounded LIFO cache of idle, authenticated [`TlsSocket`]s to the
//! configured API host. `release` both returns a connection to the cache
//! and reaps idle connections past an age/count bound — amortized into the
//! release path rather than a background thread, since spec §5 allows no
//! extra scheduling primitive beyond worker threads and the two choke
//! points (pool, DB mutex).

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

use crate::error::{Categorize, Category};
use crate::logging::Level;
use crate::log;
use crate::tls::{TlsProvider, TlsSocket};
use crate::wire::{decode_response, encode_request, BinParam, BinResult, WireError};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no cached connection available")]
    CacheEmpty,
    #[error("connect failed: {0}")]
    Connect(#[source] crate::tls::TlsError),
    #[error("I/O failure talking to the API server")]
    Io,
    #[error("malformed response: {0}")]
    Wire(#[source] WireError),
}

impl PoolError {
    pub fn category(&self) -> Category {
        match self {
            PoolError::CacheEmpty | PoolError::Connect(_) | PoolError::Io => Category::TempFail,
            PoolError::Wire(_) => Category::PermFail,
        }
    }
}

impl Categorize for PoolError {
    fn category(&self) -> Category {
        PoolError::category(self)
    }
}

/// Translated result of `handle_api_result` (spec §4.6 "API result handling").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOutcome {
    Retryable,
    Permanent,
    Ignore,
}

/// Status codes the original groups by the same three buckets: auth
/// expired / maintenance / temporary server error retry; permission and
/// validation errors are final; quota-exceeded additionally flips the
/// process-wide "local full" flag.
pub fn handle_api_result(code: u64) -> ApiOutcome {
    match code {
        0 => ApiOutcome::Ignore,
        4000 | 5000 => ApiOutcome::Retryable, // auth expired, maintenance
        2008 => {
            // over quota
            crate::status::set_local_full(true);
            ApiOutcome::Permanent
        }
        _ => ApiOutcome::Permanent,
    }
}

struct Idle<P: TlsProvider> {
    socket: TlsSocket<P>,
    idled_at: Instant,
}

const MAX_IDLE: usize = 16;
const MAX_IDLE_AGE: Duration = Duration::from_secs(300);

/// Bounded LIFO cache of idle authenticated connections to one API host.
pub struct ApiPool<P: TlsProvider> {
    host: Mutex<SocketAddr>,
    idle: Mutex<VecDeque<Idle<P>>>,
}

impl<P: TlsProvider> ApiPool<P> {
    pub fn new(host: SocketAddr) -> Self {
        ApiPool { host: Mutex::new(host), idle: Mutex::new(VecDeque::new()) }
    }

    /// Updates the target API host; existing idle connections are left
    /// untouched (callers draining the pool first will simply reconnect to
    /// the new host on their next `get`).
    pub fn set_server(&self, host: SocketAddr) {
        *self.host.lock() = host;
    }

    /// Returns a connection ready for a request, opening a new one if the
    /// cache is empty.
    pub fn get(&self) -> Result<TlsSocket<P>, PoolError> {
        if let Some(socket) = self.get_from_cache() {
            return Ok(socket);
        }
        let host = *self.host.lock();
        TlsSocket::connect(host, "api", Duration::from_secs(10)).map_err(PoolError::Connect)
    }

    /// Non-blocking: returns a cached connection immediately, or `None`.
    pub fn get_from_cache(&self) -> Option<TlsSocket<P>> {
        self.idle.lock().pop_back().map(|entry| entry.socket)
    }

    /// Opportunistically opens connections up to a low-water mark.
    pub fn prepare(&self, low_water: usize) {
        let mut idle = self.idle.lock();
        while idle.len() < low_water {
            let host = *self.host.lock();
            match TlsSocket::connect(host, "api", Duration::from_secs(10)) {
                Ok(socket) => idle.push_back(Idle { socket, idled_at: Instant::now() }),
                Err(e) => {
                    log!(Level::Warning, "prepare: failed to open connection: {}", e);
                    break;
                }
            }
        }
    }

    /// Returns a healthy connection to the cache, reaping idle connections
    /// past `MAX_IDLE`/`MAX_IDLE_AGE`.
    pub fn release(&self, socket: TlsSocket<P>) {
        let mut idle = self.idle.lock();
        let now = Instant::now();
        idle.retain(|entry| now.duration_since(entry.idled_at) < MAX_IDLE_AGE);
        idle.push_back(Idle { socket, idled_at: now });
        while idle.len() > MAX_IDLE {
            idle.pop_front();
        }
    }

    /// Closes a connection without returning it to the cache (I/O error path).
    pub fn release_bad(&self, socket: TlsSocket<P>) {
        drop(socket);
    }

    /// `get` -> send a binary-framed RPC -> read a framed response ->
    /// `release` (or `release_bad` on I/O error), per spec §4.6.
    pub fn run_command(&self, command: &str, params: &[BinParam]) -> Result<BinResult, PoolError> {
        let mut socket = self.get()?;
        let request = encode_request(command, params).map_err(PoolError::Wire)?;

        if write_all(&mut socket, &request).is_err() {
            self.release_bad(socket);
            return Err(PoolError::Io);
        }

        let response = match read_framed_response(&mut socket) {
            Ok(bytes) => bytes,
            Err(_) => {
                self.release_bad(socket);
                return Err(PoolError::Io);
            }
        };

        self.release(socket);
        decode_response(&response).map_err(PoolError::Wire)
    }
}

fn write_all<P: TlsProvider>(socket: &mut TlsSocket<P>, mut buf: &[u8]) -> Result<(), ()> {
    while !buf.is_empty() {
        match socket.write(buf) {
            crate::tls::Signal::Ok(0) => return Err(()),
            crate::tls::Signal::Ok(n) => buf = &buf[n..],
            crate::tls::Signal::WantRead | crate::tls::Signal::WantWrite => continue,
            crate::tls::Signal::Fail => return Err(()),
        }
    }
    Ok(())
}

fn read_framed_response<P: TlsProvider>(socket: &mut TlsSocket<P>) -> Result<Vec<u8>, ()> {
    let mut len_buf = [0u8; 4];
    read_exact(socket, &mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    read_exact(socket, &mut body)?;
    Ok(body)
}

fn read_exact<P: TlsProvider>(socket: &mut TlsSocket<P>, mut buf: &mut [u8]) -> Result<(), ()> {
    while !buf.is_empty() {
        match socket.read(buf) {
            crate::tls::Signal::Ok(0) => return Err(()),
            crate::tls::Signal::Ok(n) => {
                let tmp = buf;
                buf = &mut tmp[n..];
            }
            crate::tls::Signal::WantRead | crate::tls::Signal::WantWrite => continue,
            crate::tls::Signal::Fail => return Err(()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_api_result_sets_local_full_on_quota_exceeded() {
        crate::status::set_local_full(false);
        assert_eq!(handle_api_result(2008), ApiOutcome::Permanent);
        assert!(crate::status::is_local_full());
        crate::status::set_local_full(false);
    }

    #[test]
    fn handle_api_result_buckets_known_codes() {
        assert_eq!(handle_api_result(0), ApiOutcome::Ignore);
        assert_eq!(handle_api_result(4000), ApiOutcome::Retryable);
        assert_eq!(handle_api_result(9999), ApiOutcome::Permanent);
    }
}
