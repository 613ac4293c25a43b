//! Structured, leveled log sink (spec §4.1).
//!
//! The sink is opened lazily on first use and flushed after every record.
//! If the log file cannot be opened the call is silently dropped — logging
//! must never fail or panic the caller. The timestamp format is emitted by
//! hand, digit by digit, to avoid any locale dependence, matching the
//! original `time_format`/`psync_debug` in `plibs.c`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Datelike, Timelike, Utc};
use parking_lot::Mutex;

/// Compile-time enumerated log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Notice,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Linear name lookup, matching the original's `debug_levels` table scan.
    pub fn as_str(self) -> &'static str {
        const NAMES: &[(Level, &str)] = &[
            (Level::Debug, "DEBUG"),
            (Level::Notice, "NOTICE"),
            (Level::Warning, "WARNING"),
            (Level::Error, "ERROR"),
            (Level::Critical, "CRITICAL"),
        ];
        for (lvl, name) in NAMES {
            if *lvl == self {
                return name;
            }
        }
        "BAD_ERROR_CODE"
    }
}

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static SINK: OnceLock<Mutex<Option<File>>> = OnceLock::new();
static MIN_LEVEL: OnceLock<Level> = OnceLock::new();

/// Sets the log file path. Must be called before the first `log` call to
/// take effect; later calls (or none at all) fall back to `./vaultsync.log`.
pub fn init(path: impl AsRef<Path>) {
    let _ = LOG_PATH.set(path.as_ref().to_path_buf());
}

/// Sets the minimum level a record must meet to be written, matching the
/// original's `D_ERROR<=DEBUG_LEVEL` filter. Must be called before the first
/// `log` call to take effect; later calls (or none at all) default to
/// `Level::Warning`.
pub fn set_min_level(level: Level) {
    let _ = MIN_LEVEL.set(level);
}

fn min_level() -> Level {
    MIN_LEVEL.get().copied().unwrap_or(Level::Warning)
}

fn sink() -> &'static Mutex<Option<File>> {
    SINK.get_or_init(|| {
        let path = LOG_PATH
            .get()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("vaultsync.log"));
        let file = OpenOptions::new().create(true).append(true).open(path).ok();
        Mutex::new(file)
    })
}

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn format_timestamp() -> String {
    let now = Utc::now();
    let mut out = String::with_capacity(31);
    out.push_str(DAY_NAMES[now.weekday().num_days_from_sunday() as usize]);
    out.push_str(", ");
    let day = now.day();
    out.push((b'0' + (day / 10) as u8) as char);
    out.push((b'0' + (day % 10) as u8) as char);
    out.push(' ');
    out.push_str(MONTH_NAMES[(now.month() - 1) as usize]);
    out.push(' ');
    let year = now.year() as u32;
    out.push((b'0' + (year / 1000 % 10) as u8) as char);
    out.push((b'0' + (year / 100 % 10) as u8) as char);
    out.push((b'0' + (year / 10 % 10) as u8) as char);
    out.push((b'0' + (year % 10) as u8) as char);
    out.push(' ');
    let (hour, min, sec) = (now.hour(), now.minute(), now.second());
    for part in [hour, min, sec] {
        out.push((b'0' + (part / 10) as u8) as char);
        out.push((b'0' + (part % 10) as u8) as char);
        if part != sec {
            out.push(':');
        }
    }
    out.push_str(" +0000");
    out
}

/// Formats and appends one log record. Never panics; silently drops the
/// record if it falls below the configured minimum level, or if the sink
/// cannot be opened or written to.
pub fn log(file: &str, function: &str, line: u32, level: Level, args: fmt::Arguments<'_>) {
    if level < min_level() {
        return;
    }
    let mut guard = sink().lock();
    let Some(handle) = guard.as_mut() else {
        return;
    };
    let line_text = format!(
        "{} {}: {}:{} (function {}): {}\n",
        format_timestamp(),
        level.as_str(),
        file,
        line,
        function,
        args
    );
    if handle.write_all(line_text.as_bytes()).is_ok() {
        let _ = handle.flush();
    }
}

/// Captures the enclosing function's name, the closest stable-Rust
/// equivalent of C's `__FUNCTION__`.
#[macro_export]
macro_rules! fn_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}

/// Logs at the given level with `file!()`/`line!()`/the enclosing function
/// name captured automatically.
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        $crate::logging::log(file!(), $crate::fn_name!(), line!(), $level, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_round_trip() {
        assert_eq!(Level::Error.as_str(), "ERROR");
        assert_eq!(Level::Critical.as_str(), "CRITICAL");
    }

    #[test]
    fn timestamp_has_fixed_width() {
        let ts = format_timestamp();
        // "Sun, 30 Jul 2026 12:34:56 +0000" == 31 bytes.
        assert_eq!(ts.len(), 31);
        assert_eq!(&ts[3..5], ", ");
    }

    #[test]
    fn log_does_not_panic_on_bad_path() {
        // logging a message before any init() call must never panic, even
        // though the default path may not be writable in a sandboxed test
        // environment.
        log!(Level::Debug, "hello {}", 42);
    }
}
