//! Error types surfaced to callers of the client library.
//!
//! Only configuration and start-up problems are returned as values. Runtime
//! failures on an established connection are logged and translate into the
//! connection closing; queued commands are dropped and callers notice by the
//! absence of a response signal.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// The canonical error type of the client library.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The projector address could not be parsed.
    #[error("invalid projector address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A configuration file could not be read, parsed, or written.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An operation needed the I/O runtime but the pool is stopped.
    #[error("projector pool is not running")]
    PoolNotRunning,

    /// The I/O runtime could not be built.
    #[error("failed to build the I/O runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The connection attempt failed: the socket did not open, or the
    /// projector demanded authentication (which this library rejects).
    #[error("projector {id:?} failed to connect")]
    ConnectFailed { id: String },

    /// `connect_on_start` was set and the projector did not become ready in
    /// time.
    #[error("projector {id:?} did not connect within {timeout:?}")]
    StartTimeout { id: String, timeout: Duration },
}
