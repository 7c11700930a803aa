//! Frame encoding and decoding for the WX station remote protocol.
//!
//! Commands are short ASCII frames. Reads are a single opcode character,
//! remote-mode switches are the literal `remote<digit>`, and every command that
//! carries a value ends with a one-byte checksum: the sum of all preceding bytes
//! modulo 256.
//!
//! Responses are validated in two steps. [`validate`] checks length, prefix and
//! trailing checksum; the `decode_*` functions then pick typed fields at fixed
//! offsets and assume validation already passed.
//!
//! ```
//! use wxstation_lib::codec::{checksum, Command};
//! use wxstation_lib::protocol::Channel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = Command::set_temperature(Channel::ONE, 350.0)?.encode()?;
//! assert_eq!(&frame[..6], b"s13500");
//! assert_eq!(frame[6], checksum(b"s13500")?);
//! # Ok(())
//! # }
//! ```

use crate::error::{ProtocolError, ValidationError};
use crate::protocol::{
    degree_celsius_from_internal, degree_celsius_to_internal, Channel, ChannelPair,
    ConnectionType, FirmwareVersion, OperatingMode, PresetSlot, RemoteMode, ToolType, UnitModel,
};
use std::ops::Range;

/// Width of the zero-padded decimal field of value-carrying commands.
pub const FIELD_WIDTH: usize = 4;
/// Largest value the decimal field can carry.
pub const FIELD_MAX: u16 = 9999;

/// Shortest response [`validate`] accepts: prefix plus checksum.
pub const MIN_FRAME_LEN: usize = 3;

const FIRST_FIELD: Range<usize> = 2..6;
const SECOND_FIELD: Range<usize> = 9..13;
const FIRST_DIGIT: usize = 2;
const SECOND_DIGIT: usize = 9;

/// Computes the protocol checksum: the byte sum of `data` modulo 256.
pub fn checksum(data: &[u8]) -> Result<u8, ValidationError> {
    if data.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    Ok(data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte)))
}

/// Appends the checksum of `body` to it.
pub fn with_checksum(mut body: Vec<u8>) -> Result<Vec<u8>, ValidationError> {
    let sum = checksum(&body)?;
    body.push(sum);
    Ok(body)
}

/// A command understood by the station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ReadUnitId,
    Remote(RemoteMode),
    ReadStatus,
    ReadTemperature,
    SetTemperature { channel: Channel, tenths: u16 },
    ReadSetTemperature,
    ReadPreset(PresetSlot),
    SetPreset {
        slot: PresetSlot,
        channel: Channel,
        tenths: u16,
    },
    ReadFirmware,
    ReadTool,
    /// Simulates a press of the tool's finger switch for the given time.
    Fingerswitch { channel: Channel, seconds: u16 },
    /// Sets the modes of both channels at once.
    SetModes(ChannelPair<OperatingMode>),
}

impl Command {
    /// Builds a set-temperature command from degrees Celsius.
    pub fn set_temperature(channel: Channel, celsius: f32) -> Result<Self, ValidationError> {
        Ok(Command::SetTemperature {
            channel,
            tenths: celsius_field(b's', celsius)?,
        })
    }

    /// Builds a set-preset command from degrees Celsius.
    pub fn set_preset(
        slot: PresetSlot,
        channel: Channel,
        celsius: f32,
    ) -> Result<Self, ValidationError> {
        Ok(Command::SetPreset {
            slot,
            channel,
            tenths: celsius_field(preset_set_opcode(slot), celsius)?,
        })
    }

    /// Builds a finger switch command.
    pub fn fingerswitch(channel: Channel, seconds: u32) -> Result<Self, ValidationError> {
        match u16::try_from(seconds) {
            Ok(seconds) if seconds <= FIELD_MAX => Ok(Command::Fingerswitch { channel, seconds }),
            _ => Err(ValidationError::ValueOutOfRange {
                opcode: 'x',
                value: seconds as f64,
                width: FIELD_WIDTH,
            }),
        }
    }

    /// Whether the frame ends with a checksum byte.
    pub fn is_checksummed(&self) -> bool {
        matches!(
            self,
            Command::SetTemperature { .. }
                | Command::SetPreset { .. }
                | Command::Fingerswitch { .. }
                | Command::SetModes(_)
        )
    }

    /// The response layout the station answers with, if any.
    pub fn response_kind(&self) -> Option<ResponseKind> {
        match self {
            Command::ReadUnitId => Some(ResponseKind::UnitId),
            Command::Remote(RemoteMode::Disabled) => None,
            Command::Remote(_) => Some(ResponseKind::RemoteAck),
            Command::ReadStatus => Some(ResponseKind::Status),
            Command::ReadTemperature => Some(ResponseKind::Temperature),
            Command::ReadSetTemperature => Some(ResponseKind::SetTemperature),
            Command::ReadPreset(slot) => Some(ResponseKind::Preset(*slot)),
            Command::ReadFirmware => Some(ResponseKind::Firmware),
            Command::ReadTool => Some(ResponseKind::Tool),
            Command::SetTemperature { .. }
            | Command::SetPreset { .. }
            | Command::Fingerswitch { .. }
            | Command::SetModes(_) => None,
        }
    }

    /// Renders the command into its wire frame.
    ///
    /// Fails with [`ValidationError::ValueOutOfRange`] before producing any byte
    /// if a numeric payload does not fit its field.
    pub fn encode(&self) -> Result<Vec<u8>, ValidationError> {
        let body = match self {
            Command::ReadUnitId => vec![b'?'],
            Command::Remote(mode) => {
                let mut body = b"remote".to_vec();
                body.push(mode.digit());
                body
            }
            Command::ReadStatus => vec![b'Q'],
            Command::ReadTemperature => vec![b'R'],
            Command::ReadSetTemperature => vec![b'S'],
            Command::ReadPreset(slot) => vec![preset_read_opcode(*slot)],
            Command::ReadFirmware => vec![b'V'],
            Command::ReadTool => vec![b'Y'],
            Command::SetTemperature { channel, tenths } => value_body(b's', *channel, *tenths)?,
            Command::SetPreset {
                slot,
                channel,
                tenths,
            } => value_body(preset_set_opcode(*slot), *channel, *tenths)?,
            Command::Fingerswitch { channel, seconds } => value_body(b'x', *channel, *seconds)?,
            Command::SetModes(modes) => vec![
                b'q',
                b'1',
                modes.channel1.digit(),
                modes.channel2.digit(),
                b'0',
                b'0',
            ],
        };
        if self.is_checksummed() {
            with_checksum(body)
        } else {
            Ok(body)
        }
    }

    /// Parses a frame as produced by [`Command::encode`].
    ///
    /// This is the station's side of the protocol; the simulated station uses it
    /// to understand what it was sent.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        match frame {
            b"?" => return Ok(Command::ReadUnitId),
            b"Q" => return Ok(Command::ReadStatus),
            b"R" => return Ok(Command::ReadTemperature),
            b"S" => return Ok(Command::ReadSetTemperature),
            b"T" => return Ok(Command::ReadPreset(PresetSlot::One)),
            b"U" => return Ok(Command::ReadPreset(PresetSlot::Two)),
            b"V" => return Ok(Command::ReadFirmware),
            b"Y" => return Ok(Command::ReadTool),
            b"remote0" => return Ok(Command::Remote(RemoteMode::Disabled)),
            b"remote1" => return Ok(Command::Remote(RemoteMode::Enabled)),
            b"remote2" => return Ok(Command::Remote(RemoteMode::EnabledWithLock)),
            _ => {}
        }

        // Every remaining command is opcode, five payload bytes and a checksum.
        let expected = 1 + 1 + FIELD_WIDTH + 1;
        if frame.len() != expected {
            return Err(ProtocolError::FormatError {
                field: "command",
                content: lossy(frame),
            });
        }
        verify_checksum(frame)?;

        let opcode = frame[0];
        if opcode == b'q' {
            if &frame[1..2] != b"1" || &frame[4..6] != b"00" {
                return Err(ProtocolError::FormatError {
                    field: "mode command",
                    content: lossy(frame),
                });
            }
            let modes = ChannelPair::new(mode_at(frame, 2)?, mode_at(frame, 3)?);
            return Ok(Command::SetModes(modes));
        }

        let channel = Channel::try_from(digit_at(frame, 1, "channel")?).map_err(|_| {
            ProtocolError::FormatError {
                field: "channel",
                content: lossy(&frame[1..2]),
            }
        })?;
        let value = number_field(frame, 2..2 + FIELD_WIDTH, "value")?;
        match opcode {
            b's' => Ok(Command::SetTemperature {
                channel,
                tenths: value,
            }),
            b't' => Ok(Command::SetPreset {
                slot: PresetSlot::One,
                channel,
                tenths: value,
            }),
            b'u' => Ok(Command::SetPreset {
                slot: PresetSlot::Two,
                channel,
                tenths: value,
            }),
            b'x' => Ok(Command::Fingerswitch {
                channel,
                seconds: value,
            }),
            _ => Err(ProtocolError::FormatError {
                field: "opcode",
                content: lossy(&frame[..1]),
            }),
        }
    }
}

fn preset_read_opcode(slot: PresetSlot) -> u8 {
    match slot {
        PresetSlot::One => b'T',
        PresetSlot::Two => b'U',
    }
}

fn preset_set_opcode(slot: PresetSlot) -> u8 {
    match slot {
        PresetSlot::One => b't',
        PresetSlot::Two => b'u',
    }
}

fn celsius_field(opcode: u8, celsius: f32) -> Result<u16, ValidationError> {
    let internal = degree_celsius_to_internal(celsius);
    if celsius.is_finite() && (0..=FIELD_MAX as i64).contains(&internal) {
        Ok(internal as u16)
    } else {
        Err(ValidationError::ValueOutOfRange {
            opcode: opcode as char,
            value: celsius as f64 * 10.0,
            width: FIELD_WIDTH,
        })
    }
}

fn value_body(opcode: u8, channel: Channel, value: u16) -> Result<Vec<u8>, ValidationError> {
    if value > FIELD_MAX {
        return Err(ValidationError::ValueOutOfRange {
            opcode: opcode as char,
            value: value as f64,
            width: FIELD_WIDTH,
        });
    }
    Ok(format!("{}{}{:04}", opcode as char, channel, value).into_bytes())
}

/// The fixed layout of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    UnitId,
    /// Answer to an enabling remote command, prefixed like a unit id.
    RemoteAck,
    Status,
    Temperature,
    SetTemperature,
    Preset(PresetSlot),
    Firmware,
    Tool,
}

impl ResponseKind {
    /// The bytes every response of this kind starts with.
    pub fn prefix(&self) -> &'static [u8] {
        match self {
            ResponseKind::UnitId | ResponseKind::RemoteAck => b"?1",
            ResponseKind::Status => b"Q1",
            ResponseKind::Temperature => b"R1",
            ResponseKind::SetTemperature => b"S1",
            ResponseKind::Preset(PresetSlot::One) => b"T1",
            ResponseKind::Preset(PresetSlot::Two) => b"U1",
            ResponseKind::Firmware => b"V1",
            ResponseKind::Tool => b"Y1",
        }
    }

    /// Minimum response length, checksum included.
    pub fn min_len(&self) -> usize {
        match self {
            ResponseKind::RemoteAck => MIN_FRAME_LEN,
            ResponseKind::UnitId | ResponseKind::Status | ResponseKind::Firmware => 7,
            ResponseKind::Temperature
            | ResponseKind::SetTemperature
            | ResponseKind::Preset(_)
            | ResponseKind::Tool => 14,
        }
    }
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    UnitId(UnitModel),
    RemoteAck(Option<ConnectionType>),
    Status(ChannelPair<OperatingMode>),
    /// Temperatures in °C; the same layout serves live, set-point and preset reads.
    Temperatures(ChannelPair<f32>),
    Firmware(FirmwareVersion),
    Tools(ChannelPair<ToolType>),
}

/// Checks length, prefix and trailing checksum of a raw response.
pub fn validate(raw: &[u8], expected_prefix: &[u8]) -> Result<(), ProtocolError> {
    if raw.len() < MIN_FRAME_LEN {
        return Err(ProtocolError::TooShort {
            expected: MIN_FRAME_LEN,
            actual: raw.len(),
        });
    }
    if !raw.starts_with(expected_prefix) {
        return Err(ProtocolError::PrefixMismatch {
            expected: lossy(expected_prefix),
            actual: lossy(&raw[..expected_prefix.len().min(raw.len())]),
        });
    }
    verify_checksum(raw)
}

fn verify_checksum(raw: &[u8]) -> Result<(), ProtocolError> {
    let (received, data) = match raw.split_last() {
        Some((last, data)) if !data.is_empty() => (*last, data),
        _ => {
            return Err(ProtocolError::TooShort {
                expected: MIN_FRAME_LEN,
                actual: raw.len(),
            })
        }
    };
    let calculated = data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte));
    log::trace!("Checksum of {data:?}: calculated {calculated}, received {received}");
    if calculated == received {
        Ok(())
    } else {
        Err(ProtocolError::ChecksumMismatch {
            received,
            calculated,
        })
    }
}

/// Decodes a validated response of the given kind.
pub fn decode(raw: &[u8], kind: ResponseKind) -> Result<Response, ProtocolError> {
    Ok(match kind {
        ResponseKind::UnitId => Response::UnitId(decode_unit_id(raw)?),
        ResponseKind::RemoteAck => Response::RemoteAck(decode_remote_ack(raw)),
        ResponseKind::Status => Response::Status(decode_status(raw)?),
        ResponseKind::Temperature | ResponseKind::SetTemperature | ResponseKind::Preset(_) => {
            Response::Temperatures(decode_temperatures(raw)?)
        }
        ResponseKind::Firmware => Response::Firmware(decode_firmware(raw)?),
        ResponseKind::Tool => Response::Tools(decode_tools(raw)?),
    })
}

pub fn decode_unit_id(raw: &[u8]) -> Result<UnitModel, ProtocolError> {
    Ok(UnitModel::from_code(byte_at(raw, FIRST_DIGIT)?))
}

/// Extracts the connection interface named in a remote acknowledgement.
pub fn decode_remote_ack(raw: &[u8]) -> Option<ConnectionType> {
    let contains = |needle: &[u8]| raw.windows(needle.len()).any(|window| window == needle);
    if contains(b"FRONT") {
        Some(ConnectionType::Front)
    } else if contains(b"REAR") {
        Some(ConnectionType::Rear)
    } else {
        None
    }
}

pub fn decode_status(raw: &[u8]) -> Result<ChannelPair<OperatingMode>, ProtocolError> {
    Ok(ChannelPair::new(mode_at(raw, 2)?, mode_at(raw, 3)?))
}

pub fn decode_temperatures(raw: &[u8]) -> Result<ChannelPair<f32>, ProtocolError> {
    Ok(ChannelPair::new(
        degree_celsius_from_internal(number_field(raw, FIRST_FIELD, "temperature")?),
        degree_celsius_from_internal(number_field(raw, SECOND_FIELD, "temperature")?),
    ))
}

pub fn decode_tools(raw: &[u8]) -> Result<ChannelPair<ToolType>, ProtocolError> {
    Ok(ChannelPair::new(
        ToolType::from_code(digit_at(raw, FIRST_DIGIT, "tool")?),
        ToolType::from_code(digit_at(raw, SECOND_DIGIT, "tool")?),
    ))
}

pub fn decode_firmware(raw: &[u8]) -> Result<FirmwareVersion, ProtocolError> {
    let field = slice(raw, FIRST_FIELD)?;
    match std::str::from_utf8(field) {
        Ok(version) => Ok(FirmwareVersion::new(version)),
        Err(_) => Err(ProtocolError::FormatError {
            field: "firmware",
            content: lossy(field),
        }),
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn slice(raw: &[u8], range: Range<usize>) -> Result<&[u8], ProtocolError> {
    let end = range.end;
    raw.get(range).ok_or(ProtocolError::TooShort {
        expected: end + 1,
        actual: raw.len(),
    })
}

fn byte_at(raw: &[u8], offset: usize) -> Result<u8, ProtocolError> {
    Ok(slice(raw, offset..offset + 1)?[0])
}

fn digit_at(raw: &[u8], offset: usize, field: &'static str) -> Result<u8, ProtocolError> {
    let byte = byte_at(raw, offset)?;
    if byte.is_ascii_digit() {
        Ok(byte - b'0')
    } else {
        Err(ProtocolError::FormatError {
            field,
            content: lossy(&[byte]),
        })
    }
}

fn mode_at(raw: &[u8], offset: usize) -> Result<OperatingMode, ProtocolError> {
    let byte = byte_at(raw, offset)?;
    OperatingMode::from_digit(byte).ok_or_else(|| ProtocolError::FormatError {
        field: "mode",
        content: lossy(&[byte]),
    })
}

fn number_field(
    raw: &[u8],
    range: Range<usize>,
    field: &'static str,
) -> Result<u16, ProtocolError> {
    let digits = slice(raw, range)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::FormatError {
            field,
            content: lossy(digits),
        });
    }
    Ok(digits
        .iter()
        .fold(0u16, |value, digit| value * 10 + u16::from(digit - b'0')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn response(body: &str) -> Vec<u8> {
        with_checksum(body.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn checksum_is_byte_sum_modulo_256() {
        assert_eq!(checksum(b"A"), Ok(65));
        assert_eq!(checksum(&[200, 100]), Ok(44));
        let expected = b"s13500".iter().map(|b| *b as u32).sum::<u32>() % 256;
        assert_eq!(checksum(b"s13500"), Ok(expected as u8));
        assert_matches!(checksum(b""), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn encode_set_temperature() {
        let frame = Command::set_temperature(Channel::ONE, 350.0)
            .unwrap()
            .encode()
            .unwrap();
        let mut expected = b"s13500".to_vec();
        expected.push(checksum(b"s13500").unwrap());
        assert_eq!(frame, expected);
    }

    #[test]
    fn encode_plain_reads_and_remote() {
        assert_eq!(Command::ReadTemperature.encode().unwrap(), b"R");
        assert_eq!(Command::ReadPreset(PresetSlot::Two).encode().unwrap(), b"U");
        assert_eq!(Command::ReadUnitId.encode().unwrap(), b"?");
        assert_eq!(
            Command::Remote(RemoteMode::EnabledWithLock).encode().unwrap(),
            b"remote2"
        );
    }

    #[test]
    fn encode_modes_and_fingerswitch() {
        let modes = ChannelPair::new(OperatingMode::Standby, OperatingMode::On);
        let frame = Command::SetModes(modes).encode().unwrap();
        assert_eq!(&frame[..6], b"q12100");
        assert_eq!(frame.len(), 7);

        let frame = Command::fingerswitch(Channel::TWO, 30)
            .unwrap()
            .encode()
            .unwrap();
        assert_eq!(&frame[..6], b"x20030");
    }

    #[test]
    fn encode_rejects_values_wider_than_field() {
        assert_matches!(
            Command::set_temperature(Channel::ONE, 1000.0),
            Err(ValidationError::ValueOutOfRange { opcode: 's', .. })
        );
        assert_matches!(
            Command::set_temperature(Channel::ONE, -0.5),
            Err(ValidationError::ValueOutOfRange { .. })
        );
        assert_matches!(
            Command::set_temperature(Channel::ONE, f32::NAN),
            Err(ValidationError::ValueOutOfRange { .. })
        );
        assert_matches!(
            Command::fingerswitch(Channel::ONE, 10_000),
            Err(ValidationError::ValueOutOfRange { opcode: 'x', .. })
        );
        let raw = Command::SetTemperature {
            channel: Channel::ONE,
            tenths: 10_000,
        };
        assert_matches!(raw.encode(), Err(ValidationError::ValueOutOfRange { .. }));
        assert_eq!(
            Command::set_preset(PresetSlot::Two, Channel::TWO, 999.9)
                .unwrap()
                .encode()
                .unwrap()[..6],
            *b"u29999"
        );
    }

    #[test]
    fn command_round_trip() {
        let commands = [
            Command::ReadUnitId,
            Command::Remote(RemoteMode::Disabled),
            Command::Remote(RemoteMode::Enabled),
            Command::Remote(RemoteMode::EnabledWithLock),
            Command::ReadStatus,
            Command::ReadTemperature,
            Command::ReadSetTemperature,
            Command::ReadPreset(PresetSlot::One),
            Command::ReadPreset(PresetSlot::Two),
            Command::ReadFirmware,
            Command::ReadTool,
            Command::set_temperature(Channel::TWO, 280.5).unwrap(),
            Command::set_preset(PresetSlot::One, Channel::ONE, 0.0).unwrap(),
            Command::set_preset(PresetSlot::Two, Channel::TWO, 450.0).unwrap(),
            Command::fingerswitch(Channel::ONE, 9999).unwrap(),
            Command::SetModes(ChannelPair::new(OperatingMode::AutoOff, OperatingMode::Off)),
        ];
        for command in commands {
            let frame = command.encode().unwrap();
            assert_eq!(Command::decode(&frame), Ok(command), "frame {frame:?}");
        }
    }

    #[test]
    fn command_decode_checks_checksum() {
        let mut frame = Command::set_temperature(Channel::ONE, 300.0)
            .unwrap()
            .encode()
            .unwrap();
        *frame.last_mut().unwrap() ^= 0x01;
        assert_matches!(
            Command::decode(&frame),
            Err(ProtocolError::ChecksumMismatch { .. })
        );
        assert_matches!(
            Command::decode(b"Z"),
            Err(ProtocolError::FormatError { .. })
        );
    }

    #[test]
    fn validate_response() {
        let raw = response("R12500 R22000");
        assert_eq!(validate(&raw, b"R1"), Ok(()));
        assert_matches!(
            validate(b"R1", b"R1"),
            Err(ProtocolError::TooShort {
                expected: 3,
                actual: 2
            })
        );
        assert_matches!(
            validate(&raw, b"S1"),
            Err(ProtocolError::PrefixMismatch { .. })
        );
    }

    #[test]
    fn any_change_to_the_checksum_byte_is_detected() {
        let raw = response("Q112000");
        for replacement in 0..=u8::MAX {
            if replacement == *raw.last().unwrap() {
                continue;
            }
            let mut mutated = raw.clone();
            *mutated.last_mut().unwrap() = replacement;
            assert_matches!(
                validate(&mutated, b"Q1"),
                Err(ProtocolError::ChecksumMismatch { .. })
            );
        }
    }

    #[test]
    fn decode_temperature_layout() {
        let raw = response("R13505 R20215");
        let temperatures = decode_temperatures(&raw).unwrap();
        assert_eq!(temperatures, ChannelPair::new(350.5, 21.5));
        assert_eq!(
            decode(&raw, ResponseKind::Temperature),
            Ok(Response::Temperatures(ChannelPair::new(350.5, 21.5)))
        );
    }

    #[test]
    fn decode_rejects_non_numeric_fields() {
        let raw = response("R13x05 R20215");
        assert_matches!(
            decode_temperatures(&raw),
            Err(ProtocolError::FormatError {
                field: "temperature",
                ..
            })
        );
        let raw = response("Q1x100");
        assert_matches!(
            decode_status(&raw),
            Err(ProtocolError::FormatError { field: "mode", .. })
        );
    }

    #[test]
    fn decode_short_frame_does_not_panic() {
        assert_matches!(
            decode_temperatures(b"R1250"),
            Err(ProtocolError::TooShort { .. })
        );
        assert_matches!(decode_tools(b"Y1"), Err(ProtocolError::TooShort { .. }));
    }

    #[test]
    fn decode_status_tools_firmware_unit() {
        assert_eq!(
            decode_status(&response("Q11200")).unwrap(),
            ChannelPair::new(OperatingMode::On, OperatingMode::Standby)
        );
        assert_eq!(
            decode_tools(&response("Y11000 Y23000")).unwrap(),
            ChannelPair::new(ToolType::Wxp120, ToolType::Wxmp)
        );
        assert_eq!(
            decode_tools(&response("Y18000 Y20000")).unwrap(),
            ChannelPair::new(ToolType::Unknown, ToolType::NoTool)
        );
        assert_eq!(
            decode_firmware(&response("V10064")).unwrap(),
            FirmwareVersion::new("0064")
        );
        assert_eq!(decode_unit_id(&response("?13000")).unwrap(), UnitModel::Wx2D);
    }

    #[test]
    fn decode_remote_ack_connection() {
        assert_eq!(
            decode_remote_ack(&response("?12FRONT")),
            Some(ConnectionType::Front)
        );
        assert_eq!(
            decode_remote_ack(&response("?12REAR")),
            Some(ConnectionType::Rear)
        );
        assert_eq!(decode_remote_ack(&response("?12")), None);
    }

    #[test]
    fn response_kinds_match_commands() {
        assert_eq!(
            Command::ReadTemperature.response_kind().map(|k| k.min_len()),
            Some(14)
        );
        assert_eq!(
            Command::ReadStatus.response_kind().map(|k| k.prefix()),
            Some(&b"Q1"[..])
        );
        assert_eq!(Command::Remote(RemoteMode::Disabled).response_kind(), None);
        assert_eq!(
            Command::Remote(RemoteMode::Enabled).response_kind(),
            Some(ResponseKind::RemoteAck)
        );
        assert_eq!(
            Command::set_temperature(Channel::ONE, 300.0)
                .unwrap()
                .response_kind(),
            None
        );
    }
}
