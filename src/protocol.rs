//! Typed values exchanged with a WX soldering station.
//!
//! Everything the wire protocol carries as a digit or character code has a
//! strongly typed counterpart here, with checked conversions from raw numbers.
//! Frame layouts live in [`crate::codec`].

use crate::error::ValidationError;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Number of independent heating channels on a station.
pub const NUMBER_OF_CHANNELS: usize = 2;

/// Serial line speed of the station's remote interface.
pub const BAUD_RATE: u32 = 1200;

/// Lowest firmware version, in hundredths, that supports every command.
pub const MIN_COMPATIBLE_FIRMWARE: u16 = 64;

/// Converts degrees Celsius to the station's fixed-point tenths.
pub fn degree_celsius_to_internal(value: f32) -> i64 {
    (value * 10.0).round() as i64
}

/// Converts the station's fixed-point tenths to degrees Celsius.
pub fn degree_celsius_from_internal(value: u16) -> f32 {
    value as f32 / 10.0
}

/// A heating channel, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub struct Channel(u8);

impl Channel {
    pub const ONE: Channel = Channel(1);
    pub const TWO: Channel = Channel(2);
    /// Both channels in wire order.
    pub const ALL: [Channel; NUMBER_OF_CHANNELS] = [Channel::ONE, Channel::TWO];

    /// Zero-based position of the channel.
    pub fn index(&self) -> usize {
        self.0 as usize - 1
    }
}

impl Deref for Channel {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u8> for Channel {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 | 2 => Ok(Channel(value)),
            _ => Err(ValidationError::InvalidChannel(value)),
        }
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> u8 {
        channel.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One value per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelPair<T> {
    pub channel1: T,
    pub channel2: T,
}

impl<T> ChannelPair<T> {
    pub fn new(channel1: T, channel2: T) -> Self {
        Self { channel1, channel2 }
    }

    pub fn get(&self, channel: Channel) -> &T {
        match channel.index() {
            0 => &self.channel1,
            _ => &self.channel2,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel.index() {
            0 => &mut self.channel1,
            _ => &mut self.channel2,
        }
    }
}

impl<T: fmt::Display> fmt::Display for ChannelPair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH1={}, CH2={}", self.channel1, self.channel2)
    }
}

/// Operating mode of a channel.
///
/// The station sets both channels' modes with one command, so changing a single
/// channel always requires knowing the other channel's current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum OperatingMode {
    Off = 0,
    On = 1,
    Standby = 2,
    /// Reported by the station after its own auto-off timer expired.
    AutoOff = 3,
}

impl OperatingMode {
    pub const ALL: [OperatingMode; 4] = [
        OperatingMode::Off,
        OperatingMode::On,
        OperatingMode::Standby,
        OperatingMode::AutoOff,
    ];

    /// The ASCII digit used on the wire.
    pub fn digit(&self) -> u8 {
        b'0' + *self as u8
    }

    /// Decodes an ASCII digit from the wire.
    pub fn from_digit(digit: u8) -> Option<Self> {
        Self::try_from(digit.checked_sub(b'0')?).ok()
    }
}

impl TryFrom<u8> for OperatingMode {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OperatingMode::Off),
            1 => Ok(OperatingMode::On),
            2 => Ok(OperatingMode::Standby),
            3 => Ok(OperatingMode::AutoOff),
            _ => Err(ValidationError::InvalidMode(value.to_string())),
        }
    }
}

impl FromStr for OperatingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" | "0" => Ok(OperatingMode::Off),
            "ON" | "1" => Ok(OperatingMode::On),
            "STANDBY" | "2" => Ok(OperatingMode::Standby),
            "AUTOOFF" | "AUTO-OFF" | "3" => Ok(OperatingMode::AutoOff),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatingMode::Off => "OFF",
            OperatingMode::On => "ON",
            OperatingMode::Standby => "STANDBY",
            OperatingMode::AutoOff => "AUTO-OFF",
        };
        f.write_str(name)
    }
}

/// Static attributes of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ToolInfo {
    pub name: &'static str,
    /// Rated power, if a tool is attached.
    pub power_watts: Option<u16>,
    pub description: &'static str,
    /// Rated maximum temperature in °C.
    pub max_temperature: u16,
}

/// The tool plugged into a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToolType {
    NoTool,
    Wxp120,
    Wxp200,
    Wxmp,
    Wxmt,
    Wxp65,
    Wxp80,
    Wxb200,
    /// A code the station reported that this crate does not know.
    Unknown,
}

impl ToolType {
    /// Decodes a tool code digit from the wire. Unknown codes map to [`ToolType::Unknown`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ToolType::NoTool,
            1 => ToolType::Wxp120,
            2 => ToolType::Wxp200,
            3 => ToolType::Wxmp,
            4 => ToolType::Wxmt,
            5 => ToolType::Wxp65,
            6 => ToolType::Wxp80,
            7 => ToolType::Wxb200,
            _ => ToolType::Unknown,
        }
    }

    /// The wire code of the tool; `Unknown` encodes as 9.
    pub fn code(&self) -> u8 {
        match self {
            ToolType::NoTool => 0,
            ToolType::Wxp120 => 1,
            ToolType::Wxp200 => 2,
            ToolType::Wxmp => 3,
            ToolType::Wxmt => 4,
            ToolType::Wxp65 => 5,
            ToolType::Wxp80 => 6,
            ToolType::Wxb200 => 7,
            ToolType::Unknown => 9,
        }
    }

    pub fn info(&self) -> ToolInfo {
        const fn tool(name: &'static str, watts: u16, description: &'static str) -> ToolInfo {
            ToolInfo {
                name,
                power_watts: Some(watts),
                description,
                max_temperature: 450,
            }
        }
        match self {
            ToolType::Wxp120 => tool("WXP 120", 120, "High-power soldering iron"),
            ToolType::Wxp200 => tool("WXP 200", 200, "High-power soldering iron"),
            ToolType::Wxmp => tool("WXMP", 40, "Micro soldering iron"),
            ToolType::Wxmt => tool("WXMT", 120, "Desoldering tweezers"),
            ToolType::Wxp65 => tool("WXP 65", 65, "Standard soldering iron"),
            ToolType::Wxp80 => tool("WXP 80", 80, "Standard soldering iron"),
            ToolType::Wxb200 => tool("WXB 200", 200, "Bath"),
            ToolType::NoTool => ToolInfo {
                name: "No tool",
                power_watts: None,
                description: "No tool connected",
                max_temperature: 0,
            },
            ToolType::Unknown => ToolInfo {
                name: "Unknown",
                power_watts: None,
                description: "Unknown tool",
                max_temperature: 450,
            },
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Station model reported by the unit id command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitModel {
    Wx1,
    Wx2,
    Wx2D,
    Wx2A,
    Wx1D,
    Wx1A,
    Unknown,
}

impl UnitModel {
    pub fn from_code(code: u8) -> Self {
        match code {
            b'1' => UnitModel::Wx1,
            b'2' => UnitModel::Wx2,
            b'3' => UnitModel::Wx2D,
            b'4' => UnitModel::Wx2A,
            b'5' => UnitModel::Wx1D,
            b'6' => UnitModel::Wx1A,
            _ => UnitModel::Unknown,
        }
    }

    /// The model code character; `Unknown` encodes as `'0'`.
    pub fn code(&self) -> u8 {
        match self {
            UnitModel::Wx1 => b'1',
            UnitModel::Wx2 => b'2',
            UnitModel::Wx2D => b'3',
            UnitModel::Wx2A => b'4',
            UnitModel::Wx1D => b'5',
            UnitModel::Wx1A => b'6',
            UnitModel::Unknown => b'0',
        }
    }
}

impl fmt::Display for UnitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitModel::Wx1 => "WX 1",
            UnitModel::Wx2 => "WX 2",
            UnitModel::Wx2D => "WX 2D",
            UnitModel::Wx2A => "WX 2A",
            UnitModel::Wx1D => "WX 1D",
            UnitModel::Wx1A => "WX 1A",
            UnitModel::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Remote control mode of the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RemoteMode {
    Disabled = 0,
    Enabled = 1,
    /// Remote control with the front panel buttons locked.
    EnabledWithLock = 2,
}

impl RemoteMode {
    pub fn digit(&self) -> u8 {
        b'0' + *self as u8
    }

    pub fn button_lock(&self) -> bool {
        *self == RemoteMode::EnabledWithLock
    }
}

impl FromStr for RemoteMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "disabled" | "off" => Ok(RemoteMode::Disabled),
            "1" | "enabled" | "on" => Ok(RemoteMode::Enabled),
            "2" | "enabled-with-lock" | "lock" => Ok(RemoteMode::EnabledWithLock),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for RemoteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteMode::Disabled => "disabled",
            RemoteMode::Enabled => "enabled",
            RemoteMode::EnabledWithLock => "enabled with button lock",
        };
        f.write_str(name)
    }
}

/// Which of the station's sockets the serial cable is plugged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionType {
    Front,
    Rear,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Front => f.write_str("FRONT"),
            ConnectionType::Rear => f.write_str("REAR"),
        }
    }
}

/// One of the two stored preset temperatures of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PresetSlot {
    One,
    Two,
}

impl TryFrom<u8> for PresetSlot {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PresetSlot::One),
            2 => Ok(PresetSlot::Two),
            _ => Err(ValidationError::InvalidPresetSlot(value)),
        }
    }
}

impl fmt::Display for PresetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetSlot::One => f.write_str("1"),
            PresetSlot::Two => f.write_str("2"),
        }
    }
}

/// Firmware version as reported by the station, e.g. `"0064"` for 0.64.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirmwareVersion(String);

impl FirmwareVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The version in hundredths, if the raw string is numeric.
    pub fn hundredths(&self) -> Option<u16> {
        self.0.parse().ok()
    }

    /// Whether the firmware supports all commands of this crate.
    pub fn is_compatible(&self) -> bool {
        self.hundredths()
            .is_some_and(|version| version >= MIN_COMPATIBLE_FIRMWARE)
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hundredths() {
            Some(version) => write!(f, "{}.{:02}", version / 100, version % 100),
            None => f.write_str(&self.0),
        }
    }
}
