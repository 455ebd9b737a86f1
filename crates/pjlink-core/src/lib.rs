//! # pjlink-core
//!
//! Protocol library for PJLink Class 1, the industry standard for controlling
//! network-attached projectors over TCP (port 4352).
//!
//! This crate contains everything that can be expressed without a socket:
//!
//! - **`protocol::codec`** – Constants of the wire format, frame construction,
//!   response classification, and the typed decoders for power, AV mute,
//!   input, lamp hours, and error status.
//! - **`protocol::command`** – [`PjlinkCommand`], a value holding one outbound
//!   frame and, once the projector has replied, its raw response.
//!
//! Session management (connections, queues, timeouts) lives in the companion
//! `pjlink-client` crate, which drives these types over a real TCP stream.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `pjlink_core::PjlinkCommand` instead of spelling out the module path.
pub use protocol::codec::{
    AvMuteStatus, ErrorStatus, InputType, PowerStatus, ProtocolError, ResponseCode,
};
pub use protocol::command::{CommandKind, PjlinkCommand};
