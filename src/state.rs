//! Thread-safe in-memory model of a station.
//!
//! [`StationState`] is written by the poller and by acknowledged commands and
//! read by anyone through [`StationState::snapshot`]. It has its own lock,
//! independent of the link, so readers never wait for serial traffic.

use crate::config::TemperatureLimits;
use crate::error::ConfigError;
use crate::history::{HistoryBuffer, Statistics, TemperatureSample};
use crate::protocol::{
    self as proto, Channel, ChannelPair, ConnectionType, FirmwareVersion, OperatingMode,
    PresetSlot, RemoteMode, ToolType, UnitModel,
};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};

/// Last known state of one channel; `None` until first read from the station.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelState {
    pub mode: Option<OperatingMode>,
    /// Measured temperature in °C.
    pub temperature: Option<f32>,
    /// Target temperature in °C.
    pub set_point: Option<f32>,
    pub preset1: Option<f32>,
    pub preset2: Option<f32>,
    pub tool: Option<ToolType>,
}

impl ChannelState {
    pub fn preset(&self, slot: PresetSlot) -> Option<f32> {
        match slot {
            PresetSlot::One => self.preset1,
            PresetSlot::Two => self.preset2,
        }
    }

    fn preset_mut(&mut self, slot: PresetSlot) -> &mut Option<f32> {
        match slot {
            PresetSlot::One => &mut self.preset1,
            PresetSlot::Two => &mut self.preset2,
        }
    }
}

/// The values read on every poll tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollResult {
    pub modes: ChannelPair<OperatingMode>,
    pub temperatures: ChannelPair<f32>,
    pub tools: ChannelPair<ToolType>,
}

/// The slower moving values, read every few poll ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub set_points: ChannelPair<f32>,
    pub preset1: ChannelPair<f32>,
    pub preset2: ChannelPair<f32>,
}

/// A consistent copy of the whole station state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StationSnapshot {
    pub channels: ChannelPair<ChannelState>,
    pub unit_model: Option<UnitModel>,
    pub firmware: Option<FirmwareVersion>,
    pub connection_type: Option<ConnectionType>,
    pub remote_mode: RemoteMode,
    pub button_lock: bool,
    /// Time since the session was created.
    pub uptime: Duration,
    /// Time of the last successful poll.
    pub last_updated: Option<SystemTime>,
    pub limits: TemperatureLimits,
}

impl StationSnapshot {
    pub fn channel(&self, channel: Channel) -> &ChannelState {
        self.channels.get(channel)
    }
}

/// Write counters of the fields that commands change on a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Revisions {
    mode: u64,
    set_point: u64,
    preset1: u64,
    preset2: u64,
}

impl Revisions {
    fn preset_mut(&mut self, slot: PresetSlot) -> &mut u64 {
        match slot {
            PresetSlot::One => &mut self.preset1,
            PresetSlot::Two => &mut self.preset2,
        }
    }
}

/// Command writes seen by the state when a poll started.
///
/// A poll merges a field only if no command wrote it after the mark was
/// taken, so values read before a command cannot overwrite its update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollMark(ChannelPair<Revisions>);

#[derive(Debug)]
struct Inner {
    channels: ChannelPair<ChannelState>,
    revisions: ChannelPair<Revisions>,
    histories: ChannelPair<HistoryBuffer>,
    unit_model: Option<UnitModel>,
    firmware: Option<FirmwareVersion>,
    connection_type: Option<ConnectionType>,
    remote_mode: RemoteMode,
    last_updated: Option<SystemTime>,
}

#[derive(Debug)]
pub struct StationState {
    inner: RwLock<Inner>,
    limits: TemperatureLimits,
    started: Instant,
}

impl StationState {
    pub fn new(limits: TemperatureLimits, history_capacity: usize) -> Result<Self, ConfigError> {
        limits.validate()?;
        Ok(Self {
            inner: RwLock::new(Inner {
                channels: ChannelPair::default(),
                revisions: ChannelPair::default(),
                histories: ChannelPair::new(
                    HistoryBuffer::new(history_capacity)?,
                    HistoryBuffer::new(history_capacity)?,
                ),
                unit_model: None,
                firmware: None,
                connection_type: None,
                remote_mode: RemoteMode::Disabled,
                last_updated: None,
            }),
            limits,
            started: Instant::now(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn limits(&self) -> TemperatureLimits {
        self.limits
    }

    /// Marks the start of a poll; pass the mark to [`StationState::update`] and
    /// [`StationState::update_settings`].
    pub fn mark(&self) -> PollMark {
        PollMark(self.read().revisions)
    }

    /// Merges a poll into both channels and appends one sample per channel.
    ///
    /// Modes written by a command since `mark` are kept.
    pub fn update(&self, poll: &PollResult, mark: PollMark) {
        let timestamp = SystemTime::now();
        let mut inner = self.write();
        for channel in Channel::ALL {
            let temperature = *poll.temperatures.get(channel);
            let changed = *inner.revisions.get(channel);
            let seen = *mark.0.get(channel);
            let state = inner.channels.get_mut(channel);
            if changed.mode == seen.mode {
                state.mode = Some(*poll.modes.get(channel));
            }
            state.temperature = Some(temperature);
            state.tool = Some(*poll.tools.get(channel));
            inner.histories.get_mut(channel).append(TemperatureSample {
                timestamp,
                value: temperature,
                internal: u16::try_from(proto::degree_celsius_to_internal(temperature)).ok(),
            });
        }
        inner.last_updated = Some(timestamp);
    }

    /// Merges set-points and presets into both channels, except those written
    /// by a command since `mark`.
    pub fn update_settings(&self, settings: &Settings, mark: PollMark) {
        let mut inner = self.write();
        for channel in Channel::ALL {
            let changed = *inner.revisions.get(channel);
            let seen = *mark.0.get(channel);
            let state = inner.channels.get_mut(channel);
            if changed.set_point == seen.set_point {
                state.set_point = Some(*settings.set_points.get(channel));
            }
            if changed.preset1 == seen.preset1 {
                state.preset1 = Some(*settings.preset1.get(channel));
            }
            if changed.preset2 == seen.preset2 {
                state.preset2 = Some(*settings.preset2.get(channel));
            }
        }
    }

    pub fn set_set_point(&self, channel: Channel, celsius: f32) {
        let mut inner = self.write();
        inner.channels.get_mut(channel).set_point = Some(celsius);
        inner.revisions.get_mut(channel).set_point += 1;
    }

    pub fn set_preset(&self, slot: PresetSlot, channel: Channel, celsius: f32) {
        let mut inner = self.write();
        *inner.channels.get_mut(channel).preset_mut(slot) = Some(celsius);
        *inner.revisions.get_mut(channel).preset_mut(slot) += 1;
    }

    pub fn set_modes(&self, modes: ChannelPair<OperatingMode>) {
        let mut inner = self.write();
        for channel in Channel::ALL {
            inner.channels.get_mut(channel).mode = Some(*modes.get(channel));
            inner.revisions.get_mut(channel).mode += 1;
        }
    }

    pub fn set_unit_model(&self, model: UnitModel) {
        self.write().unit_model = Some(model);
    }

    pub fn set_firmware(&self, firmware: FirmwareVersion) {
        self.write().firmware = Some(firmware);
    }

    pub fn set_remote_mode(&self, mode: RemoteMode, connection_type: Option<ConnectionType>) {
        let mut inner = self.write();
        inner.remote_mode = mode;
        if connection_type.is_some() {
            inner.connection_type = connection_type;
        }
    }

    pub fn channel(&self, channel: Channel) -> ChannelState {
        *self.read().channels.get(channel)
    }

    pub fn snapshot(&self) -> StationSnapshot {
        let inner = self.read();
        StationSnapshot {
            channels: inner.channels,
            unit_model: inner.unit_model,
            firmware: inner.firmware.clone(),
            connection_type: inner.connection_type,
            remote_mode: inner.remote_mode,
            button_lock: inner.remote_mode.button_lock(),
            uptime: self.started.elapsed(),
            last_updated: inner.last_updated,
            limits: self.limits,
        }
    }

    pub fn history_statistics(&self, channel: Channel) -> Option<Statistics> {
        self.read().histories.get(channel).statistics()
    }

    /// All samples of a channel, oldest first.
    pub fn history(&self, channel: Channel) -> Vec<TemperatureSample> {
        self.read().histories.get(channel).to_vec()
    }
}
