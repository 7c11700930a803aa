//! A connected WX station session.
//!
//! [`Station`] owns one [`TransportSession`], the [`StationState`] it keeps up
//! to date and the background [`Poller`]. Every method takes `&self`, so a
//! station can be shared between threads behind an `Arc`.
//!
//! ## Example
//!
//! ```
//! use wxstation_lib::{config::StationConfig, protocol::Channel, station::Station};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let station = Station::simulated(1, StationConfig::default())?;
//!     station.connect()?;
//!
//!     station.set_temperature(Channel::ONE, 320.0)?;
//!     let snapshot = station.snapshot();
//!     println!("Channel 1: {:?}", snapshot.channel(Channel::ONE));
//!
//!     station.close();
//!     Ok(())
//! }
//! ```

use crate::commands::WxStation;
use crate::config::{StationConfig, TemperatureLimits};
use crate::error::{Result, TransportError};
use crate::history::{Statistics, TemperatureSample, DEMO_HISTORY_CAPACITY};
use crate::poller::{self, Poller};
use crate::protocol as proto;
use crate::simulator::SimulatedLink;
use crate::state::{StationSnapshot, StationState};
use crate::transport::{Link, TransportSession};
use log::*;
use std::sync::{Arc, Mutex, PoisonError};

/// A station session shared by a poller and any number of callers.
#[derive(Debug)]
pub struct Station {
    session: Arc<TransportSession>,
    state: Arc<StationState>,
    config: StationConfig,
    poller: Mutex<Option<Poller>>,
    /// Serializes read-modify-write of the combined mode command.
    mode_lock: Mutex<()>,
}

impl Station {
    /// Creates a session on `link`. No I/O happens until [`Station::connect`].
    pub fn new(link: Box<dyn Link>, config: StationConfig) -> Result<Self> {
        config.validate()?;
        let state = StationState::new(config.limits, config.history_capacity)?;
        Ok(Self {
            session: Arc::new(TransportSession::new(link, config.retry)),
            state: Arc::new(state),
            config,
            poller: Mutex::new(None),
            mode_lock: Mutex::new(()),
        })
    }

    /// Creates a session on a serial port.
    #[cfg(feature = "serial")]
    pub fn open_serial(device: &str, config: StationConfig) -> Result<Self> {
        let link = crate::serial::SerialLink::open(device, config.timeout)?;
        Self::new(Box::new(link), config)
    }

    /// Creates a session on a simulated station with a short history.
    pub fn simulated(seed: u64, mut config: StationConfig) -> Result<Self> {
        config.history_capacity = DEMO_HISTORY_CAPACITY;
        Self::new(Box::new(SimulatedLink::new(seed)), config)
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn limits(&self) -> TemperatureLimits {
        self.state.limits()
    }

    /// Enables remote control, identifies the station, reads its full state
    /// and starts background polling.
    pub fn connect(&self) -> Result<()> {
        self.handshake()?;
        self.start_polling()
    }

    /// Enables remote control, identifies the station and reads its full state.
    pub fn handshake(&self) -> Result<()> {
        self.set_remote_mode(proto::RemoteMode::Enabled)?;
        let model = WxStation::read_unit_id(&self.session)?;
        self.state.set_unit_model(model);
        self.verify_firmware_compatibility()?;
        self.refresh()?;
        let snapshot = self.state.snapshot();
        info!(
            "Connected to {} (firmware {}) on {} socket",
            model,
            snapshot
                .firmware
                .as_ref()
                .map_or_else(|| "unknown".to_string(), ToString::to_string),
            snapshot
                .connection_type
                .map_or_else(|| "unknown".to_string(), |c| c.to_string())
        );
        Ok(())
    }

    /// Starts the background poller unless it is already running.
    pub fn start_polling(&self) -> Result<()> {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.as_ref().is_some_and(Poller::is_running) {
            return Ok(());
        }
        *poller = Some(
            Poller::spawn(
                self.session.clone(),
                self.state.clone(),
                self.config.poll_interval,
                self.config.settings_refresh_ticks,
            )
            .map_err(TransportError::from)?,
        );
        Ok(())
    }

    /// Stops the background poller after its current tick.
    pub fn stop_polling(&self) {
        let poller = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut poller) = poller {
            poller.stop();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Poller::is_running)
    }

    /// Reads modes, temperatures, tools, set-points and presets into the state now.
    pub fn refresh(&self) -> Result<()> {
        poller::poll_once(&self.session, &self.state, true)
    }

    /// Sets the target temperature of a channel in °C.
    ///
    /// Temperatures outside the configured limits are rejected before any I/O.
    pub fn set_temperature(&self, channel: proto::Channel, celsius: f32) -> Result<()> {
        self.state.limits().check(celsius)?;
        WxStation::set_temperature(&self.session, channel, celsius)?;
        self.state.set_set_point(channel, celsius);
        info!("Channel {channel} set to {celsius} °C");
        Ok(())
    }

    /// Sets the operating mode of one channel, keeping the other channel's mode.
    ///
    /// The current modes are read from the station first since the protocol only
    /// sets both channels at once. Returns the modes that were sent.
    pub fn set_mode(
        &self,
        channel: proto::Channel,
        mode: proto::OperatingMode,
    ) -> Result<proto::ChannelPair<proto::OperatingMode>> {
        let _guard = self.mode_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut modes = WxStation::read_status(&self.session)?;
        *modes.get_mut(channel) = mode;
        WxStation::set_modes(&self.session, modes)?;
        self.state.set_modes(modes);
        info!("Channel {channel} mode set to {mode}");
        Ok(modes)
    }

    /// Stores a preset temperature of a channel in °C.
    ///
    /// Presets are bound by the same limits as set-points.
    pub fn set_preset(
        &self,
        channel: proto::Channel,
        slot: proto::PresetSlot,
        celsius: f32,
    ) -> Result<()> {
        self.state.limits().check(celsius)?;
        WxStation::set_preset(&self.session, slot, channel, celsius)?;
        self.state.set_preset(slot, channel, celsius);
        info!("Channel {channel} preset {slot} set to {celsius} °C");
        Ok(())
    }

    /// Makes a stored preset the channel's target temperature and returns it.
    pub fn activate_preset(&self, channel: proto::Channel, slot: proto::PresetSlot) -> Result<f32> {
        let celsius = match self.state.channel(channel).preset(slot) {
            Some(celsius) => celsius,
            None => {
                let presets = WxStation::read_presets(&self.session, slot)?;
                self.state.set_preset(slot, proto::Channel::ONE, presets.channel1);
                self.state.set_preset(slot, proto::Channel::TWO, presets.channel2);
                *presets.get(channel)
            }
        };
        self.set_temperature(channel, celsius)?;
        Ok(celsius)
    }

    /// Presses the finger switch of a channel's tool for `seconds`.
    pub fn trigger_fingerswitch(&self, channel: proto::Channel, seconds: u32) -> Result<()> {
        WxStation::trigger_fingerswitch(&self.session, channel, seconds)?;
        info!("Finger switch on channel {channel} triggered for {seconds} s");
        Ok(())
    }

    /// Switches the remote mode and returns the reported connection socket.
    pub fn set_remote_mode(
        &self,
        mode: proto::RemoteMode,
    ) -> Result<Option<proto::ConnectionType>> {
        let connection = WxStation::set_remote_mode(&self.session, mode)?;
        self.state.set_remote_mode(mode, connection);
        info!("Remote mode {mode}");
        Ok(connection)
    }

    /// Asks the station which socket the cable is plugged into.
    ///
    /// Re-sends the current remote mode, or enables remote control if it is
    /// disabled, and reads the socket from the acknowledgement.
    pub fn detect_connection_type(&self) -> Result<Option<proto::ConnectionType>> {
        let mode = match self.state.snapshot().remote_mode {
            proto::RemoteMode::Disabled => proto::RemoteMode::Enabled,
            mode => mode,
        };
        self.set_remote_mode(mode)
    }

    /// Reads the firmware version and checks it supports every command.
    pub fn verify_firmware_compatibility(&self) -> Result<bool> {
        let firmware = WxStation::read_firmware(&self.session)?;
        let compatible = firmware.is_compatible();
        if !compatible {
            warn!(
                "Firmware {firmware} is older than {}.{:02}, some commands may fail",
                proto::MIN_COMPATIBLE_FIRMWARE / 100,
                proto::MIN_COMPATIBLE_FIRMWARE % 100
            );
        }
        self.state.set_firmware(firmware);
        Ok(compatible)
    }

    pub fn snapshot(&self) -> StationSnapshot {
        self.state.snapshot()
    }

    pub fn history_statistics(&self, channel: proto::Channel) -> Option<Statistics> {
        self.state.history_statistics(channel)
    }

    pub fn history(&self, channel: proto::Channel) -> Vec<TemperatureSample> {
        self.state.history(channel)
    }

    /// Static data of the tool last seen on a channel.
    pub fn tool_info(&self, channel: proto::Channel) -> Option<proto::ToolInfo> {
        self.state.channel(channel).tool.map(|tool| tool.info())
    }

    /// Stops polling and hands control back to the station's front panel.
    ///
    /// Disabling remote mode is attempted once; a failure is only logged.
    pub fn close(&self) {
        self.stop_polling();
        match WxStation::set_remote_mode(&self.session, proto::RemoteMode::Disabled) {
            Ok(_) => self
                .state
                .set_remote_mode(proto::RemoteMode::Disabled, None),
            Err(err) => warn!("Cannot disable remote mode: {err}"),
        }
        info!("Station closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ProtocolError, ValidationError};
    use crate::protocol::{
        Channel, ChannelPair, ConnectionType, OperatingMode, PresetSlot, RemoteMode,
    };
    use crate::transport::testing::ScriptedLink;
    use crate::transport::RetryPolicy;
    use assert_matches::assert_matches;
    use std::time::{Duration, Instant};

    /// A link whose station takes `delay` to answer, then says nothing.
    struct SlowLink {
        delay: Duration,
    }

    impl Link for SlowLink {
        fn write_frame(&mut self, _frame: &[u8]) -> std::result::Result<(), TransportError> {
            Ok(())
        }

        fn read_line(&mut self) -> std::result::Result<Vec<u8>, TransportError> {
            std::thread::sleep(self.delay);
            Ok(Vec::new())
        }
    }

    fn config() -> StationConfig {
        StationConfig {
            retry: RetryPolicy {
                attempts: 3,
                delay: Duration::ZERO,
            },
            poll_interval: Duration::from_secs(3600),
            ..StationConfig::default()
        }
    }

    fn scripted() -> (ScriptedLink, Station) {
        let link = ScriptedLink::new();
        let station = Station::new(Box::new(link.clone()), config()).unwrap();
        (link, station)
    }

    #[test]
    fn invalid_config_is_rejected_without_io() {
        let mut config = config();
        config.limits = TemperatureLimits { min: 400, max: 100 };
        let link = ScriptedLink::new();
        assert_matches!(
            Station::new(Box::new(link.clone()), config),
            Err(Error::Config(..))
        );
        assert!(link.writes().is_empty());
    }

    #[test]
    fn out_of_range_temperature_performs_no_io() {
        let (link, station) = scripted();
        assert_matches!(
            station.set_temperature(Channel::ONE, 500.0),
            Err(Error::Validation(ValidationError::OutOfRange {
                min: 50,
                max: 450,
                ..
            }))
        );
        assert_matches!(
            station.set_preset(Channel::TWO, PresetSlot::One, 20.0),
            Err(Error::Validation(ValidationError::OutOfRange { .. }))
        );
        assert!(link.writes().is_empty());
        assert_eq!(station.snapshot().channel(Channel::ONE).set_point, None);
    }

    #[test]
    fn set_temperature_updates_set_point() {
        let (link, station) = scripted();
        station.set_temperature(Channel::TWO, 320.5).unwrap();
        assert_eq!(&link.writes()[0][..6], b"s23205");
        assert_eq!(station.snapshot().channel(Channel::TWO).set_point, Some(320.5));
    }

    #[test]
    fn set_mode_keeps_other_channel() {
        let (link, station) = scripted();
        link.reply("Q11100");
        let modes = station.set_mode(Channel::ONE, OperatingMode::Standby).unwrap();
        assert_eq!(modes, ChannelPair::new(OperatingMode::Standby, OperatingMode::On));

        let writes = link.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], b"Q");
        assert_eq!(&writes[1][..6], b"q12100");
        assert_eq!(
            station.snapshot().channel(Channel::TWO).mode,
            Some(OperatingMode::On)
        );
    }

    #[test]
    fn set_mode_gives_up_after_three_corrupted_status_reads() {
        let (link, station) = scripted();
        for _ in 0..3 {
            link.reply_raw(b"Q11100\x01");
        }
        assert_matches!(
            station.set_mode(Channel::TWO, OperatingMode::Off),
            Err(Error::Protocol(ProtocolError::ChecksumMismatch { .. }))
        );
        assert_eq!(link.writes(), vec![b"Q".to_vec(); 3]);
    }

    #[test]
    fn activate_preset_reads_unknown_presets() {
        let (link, station) = scripted();
        link.reply("T12200 T22100");
        assert_eq!(station.activate_preset(Channel::TWO, PresetSlot::One).unwrap(), 210.0);

        let writes = link.writes();
        assert_eq!(writes[0], b"T");
        assert_eq!(&writes[1][..6], b"s22100");
        let snapshot = station.snapshot();
        assert_eq!(snapshot.channel(Channel::TWO).set_point, Some(210.0));
        assert_eq!(snapshot.channel(Channel::ONE).preset1, Some(220.0));

        // Known presets are not read again.
        station.activate_preset(Channel::ONE, PresetSlot::One).unwrap();
        assert_eq!(link.writes().len(), 3);
    }

    #[test]
    fn outdated_firmware_is_reported() {
        let (link, station) = scripted();
        link.reply("V10052");
        assert!(!station.verify_firmware_compatibility().unwrap());
        assert_eq!(station.snapshot().firmware.unwrap().as_str(), "0052");
    }

    #[test]
    fn close_hands_back_control() {
        let (link, station) = scripted();
        link.reply("?121 FRONT");
        station.set_remote_mode(RemoteMode::EnabledWithLock).unwrap();
        assert!(station.snapshot().button_lock);

        station.close();
        assert_eq!(link.writes().last(), Some(&b"remote0".to_vec()));
        assert_eq!(link.reads(), 1);
        let snapshot = station.snapshot();
        assert_eq!(snapshot.remote_mode, RemoteMode::Disabled);
        assert!(!snapshot.button_lock);
        assert_eq!(snapshot.connection_type, Some(ConnectionType::Front));
    }

    #[test]
    fn connect_to_simulated_station() {
        let station = Station::simulated(11, config()).unwrap();
        station.connect().unwrap();
        assert!(station.is_polling());

        let snapshot = station.snapshot();
        assert_eq!(snapshot.unit_model, Some(proto::UnitModel::Wx2));
        assert!(snapshot.firmware.as_ref().is_some_and(|f| f.is_compatible()));
        assert_eq!(snapshot.connection_type, Some(ConnectionType::Front));
        assert_eq!(snapshot.remote_mode, RemoteMode::Enabled);
        assert_eq!(snapshot.channel(Channel::ONE).set_point, Some(250.0));
        assert!(snapshot.last_updated.is_some());
        assert_eq!(
            station.tool_info(Channel::TWO).map(|info| info.name),
            Some("WXMP")
        );
        assert!(station.history_statistics(Channel::ONE).is_some());

        assert_eq!(
            station.detect_connection_type().unwrap(),
            Some(ConnectionType::Front)
        );

        station.close();
        assert!(!station.is_polling());
        assert_eq!(station.snapshot().remote_mode, RemoteMode::Disabled);
    }

    #[test]
    fn refresh_does_not_undo_a_concurrent_set_temperature() {
        let link = ScriptedLink::new();
        link.reply("Q11200")
            .reply("R12500 R22000")
            .reply("Y11000 Y22000")
            .reply("S13000 S22000")
            .reply_raw(b"garbage")
            .reply("T12000 T22000")
            .reply("U13000 U23000");
        let mut config = config();
        config.retry.delay = Duration::from_millis(400);
        let station = Station::new(Box::new(link.clone()), config).unwrap();

        std::thread::scope(|scope| {
            let refresh = scope.spawn(|| station.refresh());
            // The refresh is now waiting to retry the preset read.
            std::thread::sleep(Duration::from_millis(150));
            station.set_temperature(Channel::ONE, 350.0).unwrap();
            refresh.join().unwrap().unwrap();
        });

        let opcodes: Vec<u8> = link.writes().iter().map(|frame| frame[0]).collect();
        assert_eq!(opcodes, b"QRYSTsTU");
        let snapshot = station.snapshot();
        assert_eq!(snapshot.channel(Channel::ONE).set_point, Some(350.0));
        assert_eq!(snapshot.channel(Channel::TWO).set_point, Some(200.0));
        assert_eq!(snapshot.channel(Channel::ONE).preset2, Some(300.0));
    }

    #[test]
    fn snapshot_does_not_wait_for_the_link() {
        let mut config = config();
        config.retry.attempts = 1;
        let link = SlowLink {
            delay: Duration::from_millis(800),
        };
        let station = Station::new(Box::new(link), config).unwrap();

        std::thread::scope(|scope| {
            let refresh = scope.spawn(|| station.refresh());
            std::thread::sleep(Duration::from_millis(100));
            let started = Instant::now();
            let snapshot = station.snapshot();
            assert!(started.elapsed() < Duration::from_millis(200));
            assert_eq!(snapshot.last_updated, None);
            assert!(!refresh.is_finished());
            assert_matches!(
                refresh.join().unwrap(),
                Err(Error::Protocol(ProtocolError::NoResponse))
            );
        });
    }

    #[test]
    fn handshake_with_old_station_on_rear_socket() {
        let link = SimulatedLink::new(4)
            .with_connection(ConnectionType::Rear)
            .with_firmware("0052");
        let station = Station::new(Box::new(link), config()).unwrap();
        station.handshake().unwrap();
        assert!(!station.is_polling());

        let snapshot = station.snapshot();
        assert_eq!(snapshot.connection_type, Some(ConnectionType::Rear));
        assert!(!snapshot.firmware.unwrap().is_compatible());
        assert!(!station.verify_firmware_compatibility().unwrap());
    }

    #[test]
    fn concurrent_mode_changes_do_not_clobber() {
        let station = Arc::new(Station::simulated(2, config()).unwrap());
        let handles: Vec<_> = [
            (Channel::ONE, OperatingMode::Off),
            (Channel::TWO, OperatingMode::On),
        ]
        .into_iter()
        .map(|(channel, mode)| {
            let station = station.clone();
            std::thread::spawn(move || station.set_mode(channel, mode).unwrap())
        })
        .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        station.refresh().unwrap();
        let snapshot = station.snapshot();
        assert_eq!(snapshot.channel(Channel::ONE).mode, Some(OperatingMode::Off));
        assert_eq!(snapshot.channel(Channel::TWO).mode, Some(OperatingMode::On));
    }

    #[test]
    fn simulated_station_uses_demo_history() {
        let station = Station::simulated(2, config()).unwrap();
        for _ in 0..150 {
            station.refresh().unwrap();
        }
        assert_eq!(station.history(Channel::ONE).len(), DEMO_HISTORY_CAPACITY);
    }
}
