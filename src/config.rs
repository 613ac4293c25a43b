//! Process-wide configuration (spec §6 "Process-wide configuration").
//!
//! Built by the embedding application and handed to the modules that need
//! it; this crate never reads a config *file* itself (out of scope, §1).

use std::path::PathBuf;

/// Which crypto/TLS back-end a build was compiled with (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenSsl,
    Rustls,
}

impl Backend {
    /// The back-end actually compiled into this build, per the mutually
    /// exclusive `backend-openssl`/`backend-rustls` Cargo features.
    pub const fn compiled() -> Self {
        #[cfg(feature = "backend-openssl")]
        {
            Backend::OpenSsl
        }
        #[cfg(all(feature = "backend-rustls", not(feature = "backend-openssl")))]
        {
            Backend::Rustls
        }
    }
}

/// Process-wide configuration consumed by the pool, HTTP client and logging
/// sink.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hostname (no scheme, no port) of the binary-RPC API the pool
    /// connects to.
    pub api_host: String,
    /// Minimum level a log record must meet to be written.
    pub debug_level: crate::logging::Level,
    /// Destination file for `logging::log`.
    pub log_path: PathBuf,
    /// Backend selected at build time; stored here so callers can assert it
    /// matches what they expect rather than re-deriving it from `cfg!`.
    pub backend: Backend,
}

impl Config {
    pub fn new(api_host: impl Into<String>, log_path: impl Into<PathBuf>) -> Self {
        Config {
            api_host: api_host.into(),
            debug_level: crate::logging::Level::Warning,
            log_path: log_path.into(),
            backend: Backend::compiled(),
        }
    }

    /// Applies `self.log_path` and `self.debug_level` to the global logging
    /// sink. Must be called once, before the first `log!` call, to take
    /// effect (spec §4.1).
    pub fn apply_logging(&self) {
        crate::logging::init(&self.log_path);
        crate::logging::set_min_level(self.debug_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_defaults_to_warning_and_compiled_backend() {
        let cfg = Config::new("api.example.com", "/tmp/vaultsync.log");
        assert_eq!(cfg.api_host, "api.example.com");
        assert_eq!(cfg.debug_level, crate::logging::Level::Warning);
        assert_eq!(cfg.backend, Backend::compiled());
    }

    #[test]
    fn apply_logging_filters_records_below_the_configured_level() {
        // `set_min_level`/`init` only take effect on the first call for the
        // whole test binary, so this is the only test allowed to call
        // `apply_logging` — keep it that way.
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("vaultsync.log");
        let mut cfg = Config::new("api.example.com", &log_path);
        cfg.debug_level = crate::logging::Level::Error;
        cfg.apply_logging();

        crate::log!(crate::logging::Level::Debug, "below threshold, must not appear");
        crate::log!(crate::logging::Level::Error, "at threshold, must appear");

        let contents = std::fs::read_to_string(&log_path).unwrap_or_default();
        assert!(!contents.contains("below threshold"));
        assert!(contents.contains("at threshold"));
    }
}
