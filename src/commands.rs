//! Low-level station commands.
//!
//! [`WxStation`] maps every wire operation to one typed call on a
//! [`TransportSession`]. The functions are stateless: they neither validate
//! temperature limits nor touch any [`crate::state::StationState`]; that is
//! the job of [`crate::station::Station`].
//!
//! ```
//! use wxstation_lib::commands::WxStation;
//! use wxstation_lib::simulator::SimulatedLink;
//! use wxstation_lib::transport::{RetryPolicy, TransportSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = TransportSession::new(Box::new(SimulatedLink::new(7)), RetryPolicy::default());
//! let temperatures = WxStation::read_temperatures(&session)?;
//! println!("Temperatures: {}", temperatures);
//! # Ok(())
//! # }
//! ```

use crate::codec::{self, Command};
use crate::error::{ProtocolError, Result};
use crate::protocol as proto;
use crate::state::{PollResult, Settings};
use crate::transport::TransportSession;

/// Stateless access to the commands of a WX station.
#[derive(Debug)]
pub struct WxStation;

impl WxStation {
    /// Executes a read command and decodes its validated response.
    fn read_and_decode<T, F>(session: &TransportSession, command: Command, decoder: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> std::result::Result<T, ProtocolError>,
    {
        let raw = session
            .execute(&command)?
            .ok_or(ProtocolError::NoResponse)?;
        Ok(decoder(&raw)?)
    }

    /// Executes a command that the station does not answer.
    fn send(session: &TransportSession, command: Command) -> Result<()> {
        session.execute(&command)?;
        Ok(())
    }

    /// Reads the station model.
    pub fn read_unit_id(session: &TransportSession) -> Result<proto::UnitModel> {
        Self::read_and_decode(session, Command::ReadUnitId, codec::decode_unit_id)
    }

    /// Reads the operating mode of both channels.
    pub fn read_status(
        session: &TransportSession,
    ) -> Result<proto::ChannelPair<proto::OperatingMode>> {
        Self::read_and_decode(session, Command::ReadStatus, codec::decode_status)
    }

    /// Reads the measured temperatures of both channels in °C.
    pub fn read_temperatures(session: &TransportSession) -> Result<proto::ChannelPair<f32>> {
        Self::read_and_decode(session, Command::ReadTemperature, codec::decode_temperatures)
    }

    /// Reads the target temperatures of both channels in °C.
    pub fn read_set_temperatures(session: &TransportSession) -> Result<proto::ChannelPair<f32>> {
        Self::read_and_decode(
            session,
            Command::ReadSetTemperature,
            codec::decode_temperatures,
        )
    }

    /// Reads one stored preset of both channels in °C.
    pub fn read_presets(
        session: &TransportSession,
        slot: proto::PresetSlot,
    ) -> Result<proto::ChannelPair<f32>> {
        Self::read_and_decode(session, Command::ReadPreset(slot), codec::decode_temperatures)
    }

    /// Reads the firmware version.
    pub fn read_firmware(session: &TransportSession) -> Result<proto::FirmwareVersion> {
        Self::read_and_decode(session, Command::ReadFirmware, codec::decode_firmware)
    }

    /// Reads the tools plugged into both channels.
    pub fn read_tools(session: &TransportSession) -> Result<proto::ChannelPair<proto::ToolType>> {
        Self::read_and_decode(session, Command::ReadTool, codec::decode_tools)
    }

    /// Switches the remote mode.
    ///
    /// Enabling modes are acknowledged by the station; the acknowledgement names
    /// the socket the cable is plugged into, which is returned if present.
    /// Disabling is not answered and always returns `None`.
    pub fn set_remote_mode(
        session: &TransportSession,
        mode: proto::RemoteMode,
    ) -> Result<Option<proto::ConnectionType>> {
        let command = Command::Remote(mode);
        match session.execute(&command)? {
            Some(ack) => Ok(codec::decode_remote_ack(&ack)),
            None if command.response_kind().is_none() => Ok(None),
            None => Err(ProtocolError::NoResponse.into()),
        }
    }

    /// Sets the target temperature of a channel in °C.
    pub fn set_temperature(
        session: &TransportSession,
        channel: proto::Channel,
        celsius: f32,
    ) -> Result<()> {
        Self::send(session, Command::set_temperature(channel, celsius)?)
    }

    /// Stores a preset temperature of a channel in °C.
    pub fn set_preset(
        session: &TransportSession,
        slot: proto::PresetSlot,
        channel: proto::Channel,
        celsius: f32,
    ) -> Result<()> {
        Self::send(session, Command::set_preset(slot, channel, celsius)?)
    }

    /// Sets the operating modes of both channels at once.
    pub fn set_modes(
        session: &TransportSession,
        modes: proto::ChannelPair<proto::OperatingMode>,
    ) -> Result<()> {
        Self::send(session, Command::SetModes(modes))
    }

    /// Presses the finger switch of a channel's tool for `seconds`.
    pub fn trigger_fingerswitch(
        session: &TransportSession,
        channel: proto::Channel,
        seconds: u32,
    ) -> Result<()> {
        Self::send(session, Command::fingerswitch(channel, seconds)?)
    }

    /// Reads modes, temperatures and tools, in this order.
    pub fn poll(session: &TransportSession) -> Result<PollResult> {
        let modes = Self::read_status(session)?;
        let temperatures = Self::read_temperatures(session)?;
        let tools = Self::read_tools(session)?;
        Ok(PollResult {
            modes,
            temperatures,
            tools,
        })
    }

    /// Reads set-points and both presets.
    pub fn read_settings(session: &TransportSession) -> Result<Settings> {
        Ok(Settings {
            set_points: Self::read_set_temperatures(session)?,
            preset1: Self::read_presets(session, proto::PresetSlot::One)?,
            preset2: Self::read_presets(session, proto::PresetSlot::Two)?,
        })
    }
}
