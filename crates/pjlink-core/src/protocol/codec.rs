//! PJLink Class 1 wire codec.
//!
//! Wire format of a command frame:
//! ```text
//! %1<body> <value>\r        e.g. %1POWR 1\r
//! ```
//! The matching response echoes the body and carries its payload after `=`:
//! ```text
//! %1<body>=<payload>\r      e.g. %1POWR=OK\r
//! ```
//! Frames are single-line ASCII terminated by CR, at most 136 bytes. Queries
//! use `?` as the value. A payload of `ERR1`..`ERR4` signals one of the four
//! protocol error classes instead of a result.
//!
//! The first line a projector sends after TCP accept is the authentication
//! banner: [`AUTH_DISABLED`] when no password is required, `PJLINK 1 <seed>`
//! otherwise.

use thiserror::Error;

/// TCP port a PJLink projector listens on.
pub const PORT: u16 = 4352;
/// Every frame ends with a carriage return.
pub const TERMINATOR: char = '\r';
/// First character of every command and response frame.
pub const HEADER: char = '%';
/// Protocol class; this library speaks Class 1 only.
pub const VERSION: char = '1';
/// Separates the command body from its value.
pub const SEPARATOR: char = ' ';
/// Value sent to query instead of set.
pub const QUERY: &str = "?";
/// Separates the response body from its payload.
pub const EQUALS: char = '=';
/// Prefix of the four protocol error payloads.
pub const ERROR_MARKER: &str = "ERR";
/// Payload of a successful set command.
pub const OK_MARKER: &str = "OK";
/// Maximum frame size in bytes, terminator included.
pub const MAX_FRAME: usize = 136;

/// Header of the authentication banner.
pub const AUTH_HEADER: &str = "PJLINK";
/// Banner announcing that authentication is disabled (required by this library).
pub const AUTH_DISABLED: &str = "PJLINK 0";

/// The four-character command bodies handled by the typed decoders.
pub mod body {
    /// Power on/off and power state query.
    pub const POWER: &str = "POWR";
    /// Audio/video mute.
    pub const AV_MUTE: &str = "AVMT";
    /// Input terminal selection.
    pub const INPUT: &str = "INPT";
    /// Error status report.
    pub const ERROR_STATUS: &str = "ERST";
    /// Lamp usage hours.
    pub const LAMP: &str = "LAMP";
}

/// Errors raised while constructing a command frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A command parameter is outside the range the protocol allows.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The assembled frame reaches or exceeds the PJLink maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The frame contains non-ASCII characters; PJLink frames are octet text.
    #[error("frame is not ASCII")]
    NotAscii,
}

// ── Frame construction ────────────────────────────────────────────────────────

/// Concatenates a frame without validating it. Callers pass fixed literals.
pub(crate) fn frame_unchecked(body: &str, value: &str) -> String {
    let mut frame = String::with_capacity(body.len() + value.len() + 4);
    frame.push(HEADER);
    frame.push(VERSION);
    frame.push_str(body);
    frame.push(SEPARATOR);
    frame.push_str(value);
    frame.push(TERMINATOR);
    frame
}

/// Builds the wire frame `%1<body> <value>\r`.
///
/// # Errors
///
/// Returns [`ProtocolError::NotAscii`] when body or value contain non-ASCII
/// characters, and [`ProtocolError::FrameTooLarge`] when the assembled frame
/// does not fit the PJLink limit of [`MAX_FRAME`] bytes.
pub fn build_frame(body: &str, value: &str) -> Result<String, ProtocolError> {
    let frame = frame_unchecked(body, value);
    if !frame.is_ascii() {
        return Err(ProtocolError::NotAscii);
    }
    if frame.len() >= MAX_FRAME {
        return Err(ProtocolError::FrameTooLarge {
            size: frame.len(),
            max: MAX_FRAME,
        });
    }
    Ok(frame)
}

/// Returns the body-and-value portion of an outbound wire frame, i.e. the
/// text between the two header characters and the terminator.
pub fn command_body(wire: &str) -> &str {
    let trimmed = wire.strip_suffix(TERMINATOR).unwrap_or(wire);
    trimmed.get(2..).unwrap_or("")
}

/// Returns the payload of a stored response: the text after the last `=`.
///
/// `None` means the response is malformed (no `=` present).
pub fn response_payload(response: &str) -> Option<&str> {
    response.rfind(EQUALS).map(|at| &response[at + 1..])
}

// ── Response classification ───────────────────────────────────────────────────

/// Classification of a stored response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// The projector accepted the request; the payload carries the result.
    Ok,
    /// No response was stored, or it carries no `=` payload marker.
    Invalid,
    /// `ERR1`: the projector does not support this command.
    Unsupported,
    /// `ERR2`: a parameter was out of range.
    OutOfParameter,
    /// `ERR3`: the projector cannot act right now (e.g. warming up).
    UnavailableTime,
    /// `ERR4`: projector or display failure.
    DeviceFailure,
}

/// Classifies a stored response string.
///
/// Empty and `=`-less responses are [`ResponseCode::Invalid`]. A payload
/// beginning with `ERR` is mapped through its final character; any other
/// payload is [`ResponseCode::Ok`].
pub fn response_code(response: &str) -> ResponseCode {
    if response.is_empty() {
        return ResponseCode::Invalid;
    }
    let Some(payload) = response_payload(response) else {
        return ResponseCode::Invalid;
    };
    if payload.starts_with(ERROR_MARKER) {
        match payload.chars().last() {
            Some('1') => return ResponseCode::Unsupported,
            Some('2') => return ResponseCode::OutOfParameter,
            Some('3') => return ResponseCode::UnavailableTime,
            Some('4') => return ResponseCode::DeviceFailure,
            _ => {}
        }
    }
    ResponseCode::Ok
}

/// Returns whether a set command's response reports success (`OK` payload).
pub fn set_succeeded(response: &str) -> bool {
    response_payload(response) == Some(OK_MARKER)
}

// ── Power ─────────────────────────────────────────────────────────────────────

/// Power state reported by a `POWR ?` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    /// Standby.
    Off,
    /// Lamp on.
    On,
    /// Cooling down after power off.
    Cooling,
    /// Warming up after power on.
    WarmingUp,
    /// The projector reported `ERR3`.
    UnavailableTime,
    /// The projector reported `ERR4`.
    DeviceFailure,
    /// Missing or undecodable response.
    Unknown,
}

impl std::fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PowerStatus::Off => "off",
            PowerStatus::On => "on",
            PowerStatus::Cooling => "cooling",
            PowerStatus::WarmingUp => "warming up",
            PowerStatus::UnavailableTime => "unavailable",
            PowerStatus::DeviceFailure => "failure",
            PowerStatus::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Decodes the power state from a stored `POWR` response.
pub fn power_status(response: &str) -> PowerStatus {
    match response_code(response) {
        ResponseCode::Ok => {
            let payload = response_payload(response).unwrap_or("");
            match payload.chars().last() {
                Some('0') => PowerStatus::Off,
                Some('1') => PowerStatus::On,
                Some('2') => PowerStatus::Cooling,
                Some('3') => PowerStatus::WarmingUp,
                _ => PowerStatus::Unknown,
            }
        }
        ResponseCode::UnavailableTime => PowerStatus::UnavailableTime,
        ResponseCode::DeviceFailure => PowerStatus::DeviceFailure,
        _ => PowerStatus::Unknown,
    }
}

// ── AV mute ───────────────────────────────────────────────────────────────────

/// Audio/video mute state reported by an `AVMT ?` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvMuteStatus {
    /// Audio and video are live.
    Off,
    /// Audio and video are muted.
    On,
    /// The projector reported `ERR3`.
    UnavailableTime,
    /// The projector reported `ERR4`.
    DeviceFailure,
    /// Missing or undecodable response.
    Unknown,
}

impl std::fmt::Display for AvMuteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AvMuteStatus::Off => "off",
            AvMuteStatus::On => "on",
            AvMuteStatus::UnavailableTime => "unavailable",
            AvMuteStatus::DeviceFailure => "failure",
            AvMuteStatus::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Decodes the AV mute state from a stored `AVMT` response.
///
/// Only the full mute payload `31` counts as on; every other well-formed
/// payload (`30`, or the audio/video-only states `11`..`21`) reads as off.
pub fn av_mute_status(response: &str) -> AvMuteStatus {
    match response_code(response) {
        ResponseCode::Ok => {
            let payload = response_payload(response).unwrap_or("");
            if payload.len() < 2 {
                return AvMuteStatus::Unknown;
            }
            if &payload[..2] == "31" {
                AvMuteStatus::On
            } else {
                AvMuteStatus::Off
            }
        }
        ResponseCode::UnavailableTime => AvMuteStatus::UnavailableTime,
        ResponseCode::DeviceFailure => AvMuteStatus::DeviceFailure,
        _ => AvMuteStatus::Unknown,
    }
}

// ── Lamp hours ────────────────────────────────────────────────────────────────

/// Decodes the lamp usage hours from a stored `LAMP` response.
///
/// The payload is `<hours> <on|off>` repeated per lamp; a single lamp's
/// hours are reported, multi-lamp reports are not aggregated. `None` means
/// the response was missing or undecodable.
pub fn lamp_hours(response: &str) -> Option<u32> {
    if response_code(response) != ResponseCode::Ok {
        return None;
    }
    let payload = response_payload(response)?;
    let tokens: Vec<&str> = payload.split(SEPARATOR).collect();
    if tokens.len() < 2 {
        return None;
    }
    tokens[tokens.len() - 2].parse().ok()
}

// ── Error status ──────────────────────────────────────────────────────────────

/// Bit positions shared by [`ErrorStatus::warnings`] and [`ErrorStatus::errors`].
pub mod status_bit {
    /// Cooling fan.
    pub const FAN: u16 = 1 << 0;
    /// Lamp.
    pub const LAMP: u16 = 1 << 1;
    /// Internal temperature.
    pub const TEMPERATURE: u16 = 1 << 2;
    /// Lamp cover.
    pub const COVER: u16 = 1 << 3;
    /// Air filter.
    pub const FILTER: u16 = 1 << 4;
    /// Anything the projector cannot classify.
    pub const OTHER: u16 = 1 << 5;
    /// The projector reported `ERR3` (errors mask only).
    pub const UNAVAILABLE: u16 = 1 << 6;
    /// The projector reported `ERR4` (errors mask only).
    pub const FAILURE: u16 = 1 << 7;
    /// Missing or undecodable response (errors mask only).
    pub const UNKNOWN: u16 = 1 << 8;
}

/// Decoded `ERST` report: a warning bitmask and an error bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorStatus {
    /// Bits of parts the projector flags as warning (`1`).
    pub warnings: u16,
    /// Bits of parts the projector flags as failed (`2`), plus the
    /// `UNAVAILABLE`/`FAILURE`/`UNKNOWN` bits for undecodable reports.
    pub errors: u16,
}

impl ErrorStatus {
    /// Returns whether the projector reports neither warnings nor errors.
    pub fn is_clear(&self) -> bool {
        self.warnings == 0 && self.errors == 0
    }
}

/// Decodes a stored `ERST` response into warning and error bitmasks.
///
/// The payload is six digits covering fan, lamp, temperature, cover, filter,
/// and other, in that order: `1` sets the part's warning bit, `2` its error
/// bit. Reports that cannot be decoded set [`status_bit::UNKNOWN`].
pub fn error_status(response: &str) -> ErrorStatus {
    match response_code(response) {
        ResponseCode::Ok => {
            let payload = response_payload(response).unwrap_or("");
            if payload.len() != 6 || !payload.bytes().all(|b| b.is_ascii_digit()) {
                return ErrorStatus {
                    warnings: 0,
                    errors: status_bit::UNKNOWN,
                };
            }
            let mut status = ErrorStatus::default();
            for (index, digit) in payload.bytes().enumerate() {
                match digit {
                    b'1' => status.warnings |= 1 << index,
                    b'2' => status.errors |= 1 << index,
                    _ => {}
                }
            }
            status
        }
        ResponseCode::UnavailableTime => ErrorStatus {
            warnings: 0,
            errors: status_bit::UNAVAILABLE,
        },
        ResponseCode::DeviceFailure => ErrorStatus {
            warnings: 0,
            errors: status_bit::FAILURE,
        },
        _ => ErrorStatus {
            warnings: 0,
            errors: status_bit::UNKNOWN,
        },
    }
}

/// Renders a status bitmask as a human-readable list, e.g. `"lamp, cover"`.
///
/// Bits are listed in definition order; an empty mask yields an empty string.
pub fn describe_status_bits(mask: u16) -> String {
    const LABELS: [(u16, &str); 9] = [
        (status_bit::FAN, "fan"),
        (status_bit::LAMP, "lamp"),
        (status_bit::TEMPERATURE, "temperature"),
        (status_bit::COVER, "cover"),
        (status_bit::FILTER, "filter"),
        (status_bit::OTHER, "other"),
        (status_bit::UNAVAILABLE, "unavailable"),
        (status_bit::FAILURE, "failure"),
        (status_bit::UNKNOWN, "unknown"),
    ];

    let mut out = String::new();
    for (bit, label) in LABELS {
        if mask & bit != 0 {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(label);
        }
    }
    out
}

// ── Input selection ───────────────────────────────────────────────────────────

/// Input terminal classes selectable through `INPT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// Analog RGB.
    Rgb,
    /// Composite/component video.
    Video,
    /// Digital (HDMI, DVI, SDI).
    Digital,
    /// Storage media playback.
    Storage,
    /// Network streaming.
    Network,
}

impl InputType {
    /// The wire character identifying this input class.
    pub fn type_char(self) -> char {
        match self {
            InputType::Rgb => '1',
            InputType::Video => '2',
            InputType::Digital => '3',
            InputType::Storage => '4',
            InputType::Network => '5',
        }
    }
}

/// Builds the `INPT` value for an input terminal: type character plus a
/// single decimal digit.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidArgument`] when `number` is outside 1–9.
pub fn input_value(input: InputType, number: u8) -> Result<String, ProtocolError> {
    if !(1..=9).contains(&number) {
        return Err(ProtocolError::InvalidArgument(format!(
            "input number {number} is outside 1-9"
        )));
    }
    let mut value = String::with_capacity(2);
    value.push(input.type_char());
    value.push((b'0' + number) as char);
    Ok(value)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
