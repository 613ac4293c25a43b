//! # vaultsync-core
//!
//! Core runtime substrate for a cloud file-sync client: the pieces every
//! higher-level sync/upload/download worker is built on, and nothing above
//! that layer (spec §1 "Scope").
//!
//! ## Architecture
//!
//! - `error`: coarse `Ok`/`PermFail`/`TempFail` result sentinels
//! - `logging`: structured, leveled log sink
//! - `variant`: tagged-union database cell values
//! - `classify`: file-extension -> category classifier
//! - `status`: process-wide connection/transfer/shutdown state
//! - `config`: process-wide configuration and crypto backend selection
//! - `crypto`: pluggable RSA/AES/PBKDF2 backend (OpenSSL or RustCrypto)
//! - `tls`: non-blocking TLS socket driven by readiness polling
//! - `db`: embedded relational metadata store
//! - `wire`: binary RPC request/response framing
//! - `pool`: pooled connections to the API host
//! - `http`: hand-rolled keep-alive HTTP/1.1 client for bulk transfer
//! - `metered`: byte-metered, cooperatively cancellable socket helpers
//! - `range`: download/upload range bookkeeping
//! - `filelock`: per-path advisory file locking

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod logging;
pub mod variant;
pub mod classify;
pub mod status;
pub mod config;
pub mod crypto;
pub mod tls;
pub mod db;
pub mod wire;
pub mod pool;
pub mod http;
pub mod metered;
pub mod range;
pub mod filelock;

pub use error::{Category, Categorize, SslSignal};
pub use variant::{Row, RowText, Variant};
pub use status::Status;
pub use config::{Backend, Config};
pub use db::Store;
pub use wire::{BinParam, BinResult, BinValue};
pub use pool::ApiPool;
pub use http::{HostCache, HttpSocket};
pub use tls::{Signal, TlsProvider, TlsSocket};
pub use range::{Range, RangeKind, UploadRange, UploadRangeKind};
pub use filelock::{FileLock, LockTable};
pub use classify::{classify, Category as FileCategory};

/// Crate version, exposed for diagnostics and user-agent strings.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, exposed for diagnostics and user-agent strings.
pub const NAME: &str = env!("CARGO_PKG_NAME");
