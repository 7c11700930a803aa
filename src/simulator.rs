//! A simulated WX 2 station.
//!
//! [`SimulatedLink`] is a [`Link`] that understands the same frames a real
//! station does and answers them with correctly checksummed responses. Heated
//! channels drift towards their set-point with a little noise from a seeded
//! RNG, so a given seed always produces the same run.

use crate::codec::{self, Command};
use crate::error::TransportError;
use crate::protocol::{
    degree_celsius_from_internal, degree_celsius_to_internal, ChannelPair, ConnectionType,
    FirmwareVersion, OperatingMode, PresetSlot, RemoteMode, ToolType, UnitModel,
};
use crate::transport::Link;
use log::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Largest change of a heated channel per temperature read, in °C.
const MAX_STEP: f32 = 2.0;
/// Amplitude of the measurement noise, in °C.
const NOISE: f32 = 0.5;
const STANDBY_TEMPERATURE: f32 = 150.0;
const STANDBY_STEP: f32 = 1.0;
const AMBIENT_TEMPERATURE: f32 = 25.0;
const COOLING_STEP: f32 = 2.0;
/// Highest temperature the four-digit field can carry.
const FIELD_CEILING: f32 = 999.9;

#[derive(Debug, Clone)]
struct SimulatedChannel {
    mode: OperatingMode,
    temperature: f32,
    set_point: u16,
    presets: [u16; 2],
    tool: ToolType,
}

impl SimulatedChannel {
    fn new(mode: OperatingMode, set_point: f32, tool: ToolType) -> Self {
        Self {
            mode,
            temperature: set_point,
            set_point: tenths(set_point),
            presets: [tenths(200.0), tenths(300.0)],
            tool,
        }
    }

    fn preset_mut(&mut self, slot: PresetSlot) -> &mut u16 {
        match slot {
            PresetSlot::One => &mut self.presets[0],
            PresetSlot::Two => &mut self.presets[1],
        }
    }

    fn step(&mut self, rng: &mut ChaCha8Rng) {
        match self.mode {
            OperatingMode::On => {
                let target = degree_celsius_from_internal(self.set_point);
                let noise = rng.gen_range(-NOISE..=NOISE);
                let difference = target - self.temperature;
                self.temperature = if difference.abs() > 1.0 {
                    self.temperature + difference.clamp(-MAX_STEP, MAX_STEP) + noise
                } else {
                    target + noise
                };
            }
            OperatingMode::Standby => {
                if self.temperature > STANDBY_TEMPERATURE {
                    self.temperature = (self.temperature - STANDBY_STEP).max(STANDBY_TEMPERATURE);
                }
            }
            OperatingMode::Off | OperatingMode::AutoOff => {
                self.temperature = (self.temperature - COOLING_STEP).max(AMBIENT_TEMPERATURE);
            }
        }
        self.temperature = self.temperature.clamp(0.0, FIELD_CEILING);
    }
}

fn tenths(celsius: f32) -> u16 {
    degree_celsius_to_internal(celsius.clamp(0.0, FIELD_CEILING)) as u16
}

/// A station simulated in memory.
#[derive(Debug, Clone)]
pub struct SimulatedLink {
    rng: ChaCha8Rng,
    model: UnitModel,
    firmware: FirmwareVersion,
    connection: ConnectionType,
    remote: RemoteMode,
    channels: ChannelPair<SimulatedChannel>,
    pending: Option<Vec<u8>>,
}

impl SimulatedLink {
    /// A WX 2 with a WXP 120 heating on channel 1 and a WXMP in standby on channel 2.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            model: UnitModel::Wx2,
            firmware: FirmwareVersion::new("0064"),
            connection: ConnectionType::Front,
            remote: RemoteMode::Disabled,
            channels: ChannelPair::new(
                SimulatedChannel::new(OperatingMode::On, 250.0, ToolType::Wxp120),
                SimulatedChannel::new(OperatingMode::Standby, 200.0, ToolType::Wxmp),
            ),
            pending: None,
        }
    }

    pub fn with_connection(mut self, connection: ConnectionType) -> Self {
        self.connection = connection;
        self
    }

    /// Overrides the reported firmware version, e.g. `"0052"`.
    pub fn with_firmware(mut self, firmware: &str) -> Self {
        self.firmware = FirmwareVersion::new(firmware);
        self
    }

    pub fn remote_mode(&self) -> RemoteMode {
        self.remote
    }

    fn step_temperatures(&mut self) {
        self.channels.channel1.step(&mut self.rng);
        self.channels.channel2.step(&mut self.rng);
    }

    fn pair(&self, prefix: char, value: impl Fn(&SimulatedChannel) -> u16) -> String {
        format!(
            "{prefix}1{:04} {prefix}2{:04}",
            value(&self.channels.channel1),
            value(&self.channels.channel2)
        )
    }

    /// Applies a command and returns the body of the answer, if any.
    fn respond(&mut self, command: Command) -> Option<String> {
        match command {
            Command::ReadUnitId => Some(format!("?1{}000", self.model.code() as char)),
            Command::Remote(mode) => {
                self.remote = mode;
                match mode {
                    RemoteMode::Disabled => None,
                    _ => Some(format!(
                        "?1{}{} {}",
                        self.model.code() as char,
                        mode.digit() as char,
                        self.connection
                    )),
                }
            }
            Command::ReadStatus => Some(format!(
                "Q1{}{}00",
                self.channels.channel1.mode.digit() as char,
                self.channels.channel2.mode.digit() as char
            )),
            Command::ReadTemperature => {
                self.step_temperatures();
                Some(self.pair('R', |channel| tenths(channel.temperature)))
            }
            Command::ReadSetTemperature => Some(self.pair('S', |channel| channel.set_point)),
            Command::ReadPreset(PresetSlot::One) => {
                Some(self.pair('T', |channel| channel.presets[0]))
            }
            Command::ReadPreset(PresetSlot::Two) => {
                Some(self.pair('U', |channel| channel.presets[1]))
            }
            Command::ReadFirmware => Some(format!("V1{}", self.firmware.as_str())),
            Command::ReadTool => Some(format!(
                "Y1{}000 Y2{}000",
                self.channels.channel1.tool.code(),
                self.channels.channel2.tool.code()
            )),
            Command::SetTemperature { channel, tenths } => {
                self.channels.get_mut(channel).set_point = tenths;
                None
            }
            Command::SetPreset {
                slot,
                channel,
                tenths,
            } => {
                *self.channels.get_mut(channel).preset_mut(slot) = tenths;
                None
            }
            Command::Fingerswitch { channel, seconds } => {
                // A press wakes a channel from standby, like lifting the tool.
                let state = self.channels.get_mut(channel);
                if state.mode == OperatingMode::Standby {
                    state.mode = OperatingMode::On;
                }
                debug!("Simulated finger switch on channel {channel} for {seconds} s");
                None
            }
            Command::SetModes(modes) => {
                self.channels.channel1.mode = modes.channel1;
                self.channels.channel2.mode = modes.channel2;
                None
            }
        }
    }
}

impl Link for SimulatedLink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.pending = match Command::decode(frame) {
            Ok(command) => self
                .respond(command)
                .and_then(|body| codec::with_checksum(body.into_bytes()).ok()),
            Err(err) => {
                debug!("Simulated station ignores frame {frame:?}: {err}");
                None
            }
        };
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(self.pending.take().unwrap_or_default())
    }
}
