//! Advisory in-process exclusive file lock (spec §3; `pnetlibs.h`'s
//! `psync_file_lock_t` / `psync_lock_file` / `psync_unlock_file`).
//!
//! The original's intrusive list is, once made thread-safe, just a lookup
//! table keyed by normalized path — so that's what this is: a
//! `Mutex<HashSet<PathBuf>>` rather than a hand-rolled linked list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};

#[derive(Default)]
struct Inner {
    held: Mutex<HashSet<PathBuf>>,
    released: Condvar,
}

/// Table of currently-held file locks, shared across the threads that need
/// mutual exclusion on the same path (e.g. a download and a local scan
/// racing on the same target file).
#[derive(Clone, Default)]
pub struct LockTable {
    inner: Arc<Inner>,
}

impl LockTable {
    pub fn new() -> Self {
        LockTable::default()
    }

    /// Blocks until `path` is uncontended, then locks it. Returns a guard
    /// that unlocks on drop.
    pub fn lock_file(&self, path: impl AsRef<Path>) -> FileLock {
        let path = normalize(path.as_ref());
        let mut held = self.inner.held.lock().unwrap();
        while held.contains(&path) {
            held = self.inner.released.wait(held).unwrap();
        }
        held.insert(path.clone());
        FileLock { table: self.inner.clone(), path }
    }

    /// Non-blocking variant; returns `None` if the path is already locked.
    pub fn try_lock_file(&self, path: impl AsRef<Path>) -> Option<FileLock> {
        let path = normalize(path.as_ref());
        let mut held = self.inner.held.lock().unwrap();
        if held.contains(&path) {
            return None;
        }
        held.insert(path.clone());
        Some(FileLock { table: self.inner.clone(), path })
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.to_path_buf()
}

/// Held lock on one path. Dropping it releases the lock and wakes one
/// waiter.
pub struct FileLock {
    table: Arc<Inner>,
    path: PathBuf,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let mut held = self.table.held.lock().unwrap();
        held.remove(&self.path);
        drop(held);
        self.table.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn second_lock_on_same_path_blocks_until_first_drops() {
        let table = LockTable::new();
        let guard = table.lock_file("/tmp/shared-file");
        assert!(table.try_lock_file("/tmp/shared-file").is_none());
        drop(guard);
        assert!(table.try_lock_file("/tmp/shared-file").is_some());
    }

    #[test]
    fn blocking_lock_acquires_after_release_from_another_thread() {
        let table = LockTable::new();
        let guard = table.lock_file("/tmp/contended");
        let table2 = table.clone();
        let handle = thread::spawn(move || {
            let _guard = table2.lock_file("/tmp/contended");
        });
        thread::sleep(Duration::from_millis(20));
        drop(guard);
        handle.join().unwrap();
    }

    #[test]
    fn distinct_paths_do_not_contend() {
        let table = LockTable::new();
        let _a = table.lock_file("/tmp/a");
        let _b = table.lock_file("/tmp/b");
    }
}
