//! Integration tests for the pjlink-core codec.
//!
//! These tests exercise the crate through its *public* API only, the same
//! surface `pjlink-client` builds on. They pin down the frame-shape
//! properties every accepted command must satisfy, and walk through the
//! concrete request/response exchanges of a Class 1 session:
//!
//! - frame layout: `%1<body> <value>\r`, one separator, under 136 bytes
//! - payload extraction and `ERR1`..`ERR4` classification
//! - typed decoding of power, AV mute, lamp hours, and error reports

use pjlink_core::protocol::codec::{
    self, body, describe_status_bits, status_bit, ResponseCode,
};
use pjlink_core::{AvMuteStatus, CommandKind, InputType, PjlinkCommand, PowerStatus};

/// Every accepted (body, value) pair must produce a frame that starts with
/// `%1`, ends with the terminator, contains exactly one separating space,
/// and stays under the PJLink frame limit.
#[test]
fn test_accepted_frames_share_the_class1_shape() {
    let frames = [
        codec::build_frame(body::POWER, "1").unwrap(),
        codec::build_frame(body::POWER, "?").unwrap(),
        codec::build_frame(body::AV_MUTE, "30").unwrap(),
        codec::build_frame(body::INPUT, "12").unwrap(),
        codec::build_frame(body::ERROR_STATUS, "?").unwrap(),
        codec::build_frame(body::LAMP, "?").unwrap(),
        codec::build_frame("NAME", "?").unwrap(),
    ];

    for frame in &frames {
        assert!(frame.starts_with("%1"), "frame must open with %1: {frame:?}");
        assert!(frame.ends_with('\r'), "frame must end with CR: {frame:?}");
        assert_eq!(
            frame.matches(' ').count(),
            1,
            "exactly one separator expected: {frame:?}"
        );
        assert!(frame.len() < codec::MAX_FRAME);
        assert!(frame.is_ascii());
    }
}

/// `command_body` must return exactly `<body> <value>` for any accepted
/// command, i.e. the text between the header and the terminator.
#[test]
fn test_command_body_round_trips_body_and_value() {
    let cases = [
        (body::POWER, "1"),
        (body::AV_MUTE, "31"),
        (body::INPUT, "59"),
        (body::LAMP, "?"),
    ];

    for (b, v) in cases {
        let frame = codec::build_frame(b, v).unwrap();
        assert_eq!(codec::command_body(&frame), format!("{b} {v}"));
    }
}

/// For any response of the form `%1BDY=PAYLOAD`, the raw payload accessor
/// must return exactly `PAYLOAD`.
#[test]
fn test_response_payload_extraction() {
    let mut cmd = PjlinkCommand::get_error();
    cmd.set_response("%1ERST=000000\r");
    assert_eq!(cmd.raw_response(), Some("000000"));

    let mut cmd = PjlinkCommand::get_lamp();
    cmd.set_response("%1LAMP=8933 1\r");
    assert_eq!(cmd.raw_response(), Some("8933 1"));
}

/// `ERR` plus a digit in 1–4 maps to the matching error class; any other
/// payload is `Ok`; an empty response is `Invalid`.
#[test]
fn test_response_code_classes() {
    let classes = [
        ("ERR1", ResponseCode::Unsupported),
        ("ERR2", ResponseCode::OutOfParameter),
        ("ERR3", ResponseCode::UnavailableTime),
        ("ERR4", ResponseCode::DeviceFailure),
        ("OK", ResponseCode::Ok),
        ("31", ResponseCode::Ok),
    ];

    for (payload, expected) in classes {
        let mut cmd = PjlinkCommand::get_power();
        cmd.set_response(&format!("%1POWR={payload}\r"));
        assert_eq!(cmd.response_code(), expected, "payload {payload:?}");
    }

    let cmd = PjlinkCommand::get_power();
    assert_eq!(cmd.response_code(), ResponseCode::Invalid);
}

// ── Concrete Class 1 exchanges ────────────────────────────────────────────────

#[test]
fn test_power_on_exchange() {
    let mut cmd = PjlinkCommand::set_power(true);
    assert_eq!(cmd.wire_bytes(), b"%1POWR 1\r");
    assert_eq!(cmd.wire_len(), 9);

    cmd.set_response("%1POWR=OK\r");
    assert!(cmd.succeeded());
}

#[test]
fn test_power_query_while_cooling() {
    let mut cmd = PjlinkCommand::get_power();
    assert_eq!(cmd.wire_bytes(), b"%1POWR ?\r");

    cmd.set_response("%1POWR=2\r");
    assert_eq!(cmd.power_status(), PowerStatus::Cooling);
}

#[test]
fn test_av_mute_query_exchange() {
    let mut cmd = PjlinkCommand::get_av_mute();
    assert_eq!(cmd.wire_bytes(), b"%1AVMT ?\r");

    cmd.set_response("%1AVMT=30\r");
    assert_eq!(cmd.av_mute_status(), AvMuteStatus::Off);

    cmd.set_response("%1AVMT=31\r");
    assert_eq!(cmd.av_mute_status(), AvMuteStatus::On);
}

#[test]
fn test_error_mask_exchange() {
    let mut cmd = PjlinkCommand::get_error();
    assert_eq!(cmd.wire_bytes(), b"%1ERST ?\r");

    cmd.set_response("%1ERST=020100\r");
    let status = cmd.error_status();
    assert_eq!(status.warnings, status_bit::COVER, "cover warning expected");
    assert_eq!(status.errors, status_bit::LAMP, "lamp error expected");
    assert_eq!(describe_status_bits(status.warnings), "cover");
    assert_eq!(describe_status_bits(status.errors), "lamp");
}

#[test]
fn test_lamp_hours_exchange() {
    let mut cmd = PjlinkCommand::get_lamp();
    cmd.set_response("%1LAMP=8933 1\r");
    assert_eq!(cmd.lamp_hours(), Some(8933));
}

#[test]
fn test_input_selection_frames_and_rejections() {
    assert_eq!(
        PjlinkCommand::set_input(InputType::Rgb, 2).unwrap().wire_bytes(),
        b"%1INPT 12\r"
    );
    assert_eq!(
        PjlinkCommand::set_input(InputType::Network, 9).unwrap().wire_bytes(),
        b"%1INPT 59\r"
    );
    for input in [InputType::Rgb, InputType::Video, InputType::Digital, InputType::Storage, InputType::Network] {
        assert!(PjlinkCommand::set_input(input, 0).is_err());
        assert!(PjlinkCommand::set_input(input, 10).is_err());
    }
}

#[test]
fn test_typed_constructors_set_their_kind() {
    assert_eq!(PjlinkCommand::set_power(true).kind(), CommandKind::SetPower);
    assert_eq!(PjlinkCommand::set_av_mute(true).kind(), CommandKind::SetAvMute);
    assert_eq!(
        PjlinkCommand::set_input(InputType::Video, 1).unwrap().kind(),
        CommandKind::SetInput
    );
    assert_eq!(PjlinkCommand::get_power().kind(), CommandKind::GetPower);
    assert_eq!(PjlinkCommand::get_av_mute().kind(), CommandKind::GetAvMute);
    assert_eq!(PjlinkCommand::get_lamp().kind(), CommandKind::GetLamp);
    assert_eq!(PjlinkCommand::get_error().kind(), CommandKind::GetError);
    assert_eq!(PjlinkCommand::new("NAME", "?").unwrap().kind(), CommandKind::Generic);
}
