//! One PJLink request/response pair.
//!
//! A [`PjlinkCommand`] is created by the caller, moved onto a connection's
//! pending queue, and handed back through the response signal once the
//! projector has replied. The same value carries both directions of the
//! exchange: the outbound wire frame and, eventually, the stored response.
//! Cloning performs a deep copy, so subscribers may keep commands around
//! after the signal returns.

use crate::protocol::codec::{self, AvMuteStatus, ErrorStatus, InputType, PowerStatus, ProtocolError, ResponseCode};

/// Discriminates what a command asks of the projector, and thereby which
/// typed decoder applies to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// A caller-supplied body and value outside the typed set.
    Generic,
    /// Turn the projector on or off.
    SetPower,
    /// Mute or unmute audio and video.
    SetAvMute,
    /// Select an input terminal.
    SetInput,
    /// Query the power state.
    GetPower,
    /// Query the AV mute state.
    GetAvMute,
    /// Query lamp usage hours.
    GetLamp,
    /// Query the error status report.
    GetError,
}

/// A PJLink command including its response.
///
/// The wire frame is fixed at construction; the response stays empty until
/// the connection pairs an inbound frame with this command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PjlinkCommand {
    kind: CommandKind,
    wire: String,
    response: String,
}

impl PjlinkCommand {
    /// Builds a generic command from a body and value.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the assembled frame is not ASCII or
    /// does not fit the PJLink frame limit.
    pub fn new(body: &str, value: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: CommandKind::Generic,
            wire: codec::build_frame(body, value)?,
            response: String::new(),
        })
    }

    /// Builds a generic query (`?` value) for the given body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the assembled frame is invalid.
    pub fn query(body: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: CommandKind::Generic,
            wire: codec::build_frame(body, codec::QUERY)?,
            response: String::new(),
        })
    }

    // Typed commands are assembled from fixed ASCII literals that fit the
    // frame limit by construction.
    fn fixed(kind: CommandKind, body: &str, value: &str) -> Self {
        Self {
            kind,
            wire: codec::frame_unchecked(body, value),
            response: String::new(),
        }
    }

    /// Turns the projector on (`true`) or off (`false`).
    pub fn set_power(on: bool) -> Self {
        Self::fixed(CommandKind::SetPower, codec::body::POWER, if on { "1" } else { "0" })
    }

    /// Mutes (`true`) or unmutes (`false`) audio and video together.
    pub fn set_av_mute(mute: bool) -> Self {
        Self::fixed(CommandKind::SetAvMute, codec::body::AV_MUTE, if mute { "31" } else { "30" })
    }

    /// Selects an input terminal.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidArgument`] when `number` is outside 1–9.
    pub fn set_input(input: InputType, number: u8) -> Result<Self, ProtocolError> {
        let value = codec::input_value(input, number)?;
        Ok(Self::fixed(CommandKind::SetInput, codec::body::INPUT, &value))
    }

    /// Queries the power state.
    pub fn get_power() -> Self {
        Self::fixed(CommandKind::GetPower, codec::body::POWER, codec::QUERY)
    }

    /// Queries the AV mute state.
    pub fn get_av_mute() -> Self {
        Self::fixed(CommandKind::GetAvMute, codec::body::AV_MUTE, codec::QUERY)
    }

    /// Queries lamp usage hours.
    pub fn get_lamp() -> Self {
        Self::fixed(CommandKind::GetLamp, codec::body::LAMP, codec::QUERY)
    }

    /// Queries the error status report.
    pub fn get_error() -> Self {
        Self::fixed(CommandKind::GetError, codec::body::ERROR_STATUS, codec::QUERY)
    }

    /// What this command asks of the projector.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The full outbound frame, terminator included.
    pub fn wire(&self) -> &str {
        &self.wire
    }

    /// The outbound frame as bytes, ready for a socket write.
    pub fn wire_bytes(&self) -> &[u8] {
        self.wire.as_bytes()
    }

    /// Byte size of the outbound frame.
    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// The body-and-value portion of the outbound frame, e.g. `POWR 1`.
    pub fn body(&self) -> &str {
        codec::command_body(&self.wire)
    }

    /// Whether a response has been stored on this command.
    pub fn has_response(&self) -> bool {
        !self.response.is_empty()
    }

    /// The response payload (text after `=`), if a well-formed response was
    /// stored.
    pub fn raw_response(&self) -> Option<&str> {
        codec::response_payload(&self.response)
    }

    /// Classification of the stored response.
    pub fn response_code(&self) -> ResponseCode {
        codec::response_code(&self.response)
    }

    /// Stores an inbound frame as this command's response.
    ///
    /// Called by the connection when the frame at the head of the queue is
    /// answered; a trailing terminator is stripped before storage.
    pub fn set_response(&mut self, frame: &str) {
        self.response = frame.strip_suffix(codec::TERMINATOR).unwrap_or(frame).to_string();
    }

    /// Whether a set command's response reports success.
    pub fn succeeded(&self) -> bool {
        codec::set_succeeded(&self.response)
    }

    /// Decodes the response of a power query.
    pub fn power_status(&self) -> PowerStatus {
        codec::power_status(&self.response)
    }

    /// Decodes the response of an AV mute query.
    pub fn av_mute_status(&self) -> AvMuteStatus {
        codec::av_mute_status(&self.response)
    }

    /// Decodes the response of a lamp hours query.
    pub fn lamp_hours(&self) -> Option<u32> {
        codec::lamp_hours(&self.response)
    }

    /// Decodes the response of an error status query.
    pub fn error_status(&self) -> ErrorStatus {
        codec::error_status(&self.response)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
