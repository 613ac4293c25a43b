//! Process-wide status snapshot, shutdown flag and "local full" flag
//! (spec §3, §4.6, §4.8).
//!
//! Every field here is an independent atomic counter or flag rather than one
//! struct behind a single lock — readers never need a consistent snapshot
//! across fields, only up-to-date values for whichever field they care about,
//! so plain `Ordering::SeqCst` atomics are enough.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Connected/transfer/quota counters sampled independently by callers.
#[derive(Debug, Default)]
pub struct Status {
    connected: AtomicBool,
    downloaded_bytes: AtomicU64,
    uploaded_bytes: AtomicU64,
}

impl Status {
    pub const fn new() -> Self {
        Status {
            connected: AtomicBool::new(false),
            downloaded_bytes: AtomicU64::new(0),
            uploaded_bytes: AtomicU64::new(0),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn add_downloaded(&self, bytes: u64) {
        self.downloaded_bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn add_uploaded(&self, bytes: u64) {
        self.uploaded_bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes.load(Ordering::SeqCst)
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes.load(Ordering::SeqCst)
    }
}

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static LOCAL_FULL: AtomicBool = AtomicBool::new(false);

/// Requests shutdown. Monotone: once set it is never cleared (spec §3, §5
/// "Cancellation").
pub fn shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Sets or clears the "local storage full" flag, mirroring the original
/// `psync_set_local_full`; unlike shutdown, this one does toggle (quota state
/// can recover once space is freed).
pub fn set_local_full(over: bool) {
    LOCAL_FULL.store(over, Ordering::SeqCst);
}

pub fn is_local_full() -> bool {
    LOCAL_FULL.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let status = Status::new();
        status.add_downloaded(100);
        status.add_downloaded(50);
        status.add_uploaded(7);
        assert_eq!(status.downloaded_bytes(), 150);
        assert_eq!(status.uploaded_bytes(), 7);
        assert!(!status.is_connected());
        status.set_connected(true);
        assert!(status.is_connected());
    }

    #[test]
    fn local_full_flag_toggles() {
        assert!(!is_local_full());
        set_local_full(true);
        assert!(is_local_full());
        set_local_full(false);
        assert!(!is_local_full());
    }
}
