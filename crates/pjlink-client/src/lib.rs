//! # pjlink-client
//!
//! Session management for PJLink Class 1 projectors: one logical connection
//! per device, strict request/response ordering, handshake gating, idle
//! teardown, and asynchronous response delivery.
//!
//! # Architecture
//!
//! ```text
//! application thread                    pjlink-io worker thread
//! ──────────────────                    ───────────────────────
//! Projector::send(cmd) ──channel──►  Connection task
//!                                      ├─ connect + banner check
//!                                      ├─ write head of queue
//!                                      ├─ read response, pair with head
//!                                      ├─ emit response signal ──► MessagePump inbox
//!                                      └─ re-arm idle timer
//! MessagePump::update() ◄── drains inbox on the application's own tick
//! ```
//!
//! - **[`PjlinkPool`]** – owns the tokio runtime; a single worker thread
//!   drives every connection, so connection code runs serially.
//! - **[`Projector`]** – caller-facing handle; lazily opens a connection on
//!   demand and re-opens after an idle close or failure.
//! - **[`MessagePump`]** – forwards responses from the I/O worker to an
//!   application thread via a mutex-guarded queue drained each tick.
//! - **`config`** – TOML projector list and timeout settings.
//!
//! Password-authenticated projectors are rejected by design; disable
//! authentication on the device.

pub mod config;
pub(crate) mod connection;
pub mod error;
pub mod pool;
pub mod projector;
pub mod pump;
pub mod signal;

pub use config::{load_config, save_config, ClientConfig, ConfigError, ProjectorEntry, Settings, TimeoutConfig};
pub use error::ClientError;
pub use pool::PjlinkPool;
pub use projector::Projector;
pub use pump::MessagePump;
pub use signal::{Signal, SlotId};

// The protocol types callers hold while using this crate.
pub use pjlink_core::{AvMuteStatus, CommandKind, ErrorStatus, InputType, PjlinkCommand, PowerStatus, ResponseCode};
