//! Byte-metered socket read/write helpers (spec §4.8).
//!
//! Each call updates the process-wide transfer counters and checks the
//! shutdown flag between iterations, returning early once it's set — any
//! loop longer than a single TLS read honors cooperative cancellation
//! (spec §5 "Cancellation").

use thiserror::Error;

use crate::error::{Categorize, Category};
use crate::status::{self, Status};
use crate::tls::{Signal, TlsProvider, TlsSocket};

#[derive(Debug, Error)]
pub enum MeteredError {
    #[error("shutdown requested")]
    ShuttingDown,
    #[error("socket failed")]
    SocketFailed,
}

impl MeteredError {
    pub fn category(&self) -> Category {
        match self {
            MeteredError::ShuttingDown => Category::TempFail,
            MeteredError::SocketFailed => Category::PermFail,
        }
    }
}

impl Categorize for MeteredError {
    fn category(&self) -> Category {
        MeteredError::category(self)
    }
}

/// The narrow read/write surface the metered helpers need; implemented by
/// [`TlsSocket`] and, in tests, by an in-memory fake so the shutdown/
/// accounting logic can be exercised without a live connection.
pub trait MeteredSocket {
    fn read(&mut self, buf: &mut [u8]) -> Signal;
    fn write(&mut self, buf: &[u8]) -> Signal;
}

impl<P: TlsProvider> MeteredSocket for TlsSocket<P> {
    fn read(&mut self, buf: &mut [u8]) -> Signal {
        TlsSocket::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> Signal {
        TlsSocket::write(self, buf)
    }
}

/// Reads exactly `buf.len()` bytes, accounting every chunk read against
/// `status`'s download counter. Named distinctly from the `_thread` variant
/// below to mirror separate call sites in the original rather than distinct
/// behavior.
pub fn readall_download(
    socket: &mut impl MeteredSocket,
    status: &Status,
    buf: &mut [u8],
) -> Result<usize, MeteredError> {
    readall_download_inner(socket, status, buf)
}

/// Background-worker-thread call site for the same accounting logic.
pub fn readall_download_thread(
    socket: &mut impl MeteredSocket,
    status: &Status,
    buf: &mut [u8],
) -> Result<usize, MeteredError> {
    readall_download_inner(socket, status, buf)
}

fn readall_download_inner(
    socket: &mut impl MeteredSocket,
    status: &Status,
    buf: &mut [u8],
) -> Result<usize, MeteredError> {
    let mut total = 0usize;
    while total < buf.len() {
        if status::shutdown_requested() {
            return Err(MeteredError::ShuttingDown);
        }
        match socket.read(&mut buf[total..]) {
            Signal::Ok(0) => return Ok(total),
            Signal::Ok(n) => {
                total += n;
                status.add_downloaded(n as u64);
            }
            Signal::WantRead | Signal::WantWrite => continue,
            Signal::Fail => return Err(MeteredError::SocketFailed),
        }
    }
    Ok(total)
}

/// Writes exactly `buf.len()` bytes, accounting every chunk against
/// `status`'s upload counter.
pub fn writeall_upload(
    socket: &mut impl MeteredSocket,
    status: &Status,
    buf: &[u8],
) -> Result<(), MeteredError> {
    let mut offset = 0usize;
    while offset < buf.len() {
        if status::shutdown_requested() {
            return Err(MeteredError::ShuttingDown);
        }
        match socket.write(&buf[offset..]) {
            Signal::Ok(0) => return Err(MeteredError::SocketFailed),
            Signal::Ok(n) => {
                offset += n;
                status.add_uploaded(n as u64);
            }
            Signal::WantRead | Signal::WantWrite => continue,
            Signal::Fail => return Err(MeteredError::SocketFailed),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSocket {
        unread: Vec<u8>,
        fail_after: Option<usize>,
    }

    impl MeteredSocket for FakeSocket {
        fn read(&mut self, buf: &mut [u8]) -> Signal {
            if self.unread.is_empty() {
                return Signal::Ok(0);
            }
            let n = buf.len().min(self.unread.len());
            buf[..n].copy_from_slice(&self.unread[..n]);
            self.unread.drain(..n);
            Signal::Ok(n)
        }

        fn write(&mut self, buf: &[u8]) -> Signal {
            match self.fail_after {
                Some(0) => Signal::Fail,
                Some(n) => {
                    self.fail_after = Some(n - 1);
                    Signal::Ok(buf.len())
                }
                None => Signal::Ok(buf.len()),
            }
        }
    }

    #[test]
    fn readall_download_accounts_every_chunk_and_stops_at_eof() {
        let mut socket = FakeSocket { unread: b"hello world".to_vec(), fail_after: None };
        let status = Status::new();
        let mut buf = [0u8; 32];
        let n = readall_download(&mut socket, &status, &mut buf).unwrap();
        assert_eq!(n, 11);
        assert_eq!(&buf[..11], b"hello world");
        assert_eq!(status.downloaded_bytes(), 11);
    }

    #[test]
    fn writeall_upload_accounts_every_chunk() {
        let mut socket = FakeSocket { unread: Vec::new(), fail_after: None };
        let status = Status::new();
        writeall_upload(&mut socket, &status, b"payload").unwrap();
        assert_eq!(status.uploaded_bytes(), 7);
    }

    #[test]
    fn writeall_upload_fails_on_socket_failure() {
        let mut socket = FakeSocket { unread: Vec::new(), fail_after: Some(0) };
        let status = Status::new();
        assert!(writeall_upload(&mut socket, &status, b"payload").is_err());
    }

    #[test]
    fn shutdown_flag_short_circuits_before_any_read() {
        status::shutdown();
        let mut socket = FakeSocket { unread: b"unreachable".to_vec(), fail_after: None };
        let status_snapshot = Status::new();
        let mut buf = [0u8; 4];
        let result = readall_download(&mut socket, &status_snapshot, &mut buf);
        assert!(matches!(result, Err(MeteredError::ShuttingDown)));
        assert_eq!(status_snapshot.downloaded_bytes(), 0);
    }
}
