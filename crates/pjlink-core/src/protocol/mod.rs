//! PJLink Class 1 protocol: wire constants, codec functions, and the command
//! value that travels through a connection's queue.
//!
//! # Sub-modules
//!
//! - **`codec`**   – Pure functions mapping between command values and wire
//!   strings, plus the typed response decoders.
//! - **`command`** – [`command::PjlinkCommand`], one request/response pair.

pub mod codec;
pub mod command;

pub use codec::{AvMuteStatus, ErrorStatus, InputType, PowerStatus, ProtocolError, ResponseCode};
pub use command::{CommandKind, PjlinkCommand};
