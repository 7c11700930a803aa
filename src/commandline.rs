use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;
use std::time::Duration;
use wxstation_lib::protocol as proto;

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM1")
    } else {
        String::from("/dev/ttyUSB0")
    }
}

fn parse_channel(s: &str) -> Result<proto::Channel, String> {
    let channel_num =
        clap_num::maybe_hex::<u8>(s).map_err(|e| format!("Invalid channel number format: {e}"))?;
    proto::Channel::try_from(channel_num).map_err(|e| e.to_string())
}

fn parse_preset_slot(s: &str) -> Result<proto::PresetSlot, String> {
    let slot_num =
        clap_num::maybe_hex::<u8>(s).map_err(|e| format!("Invalid preset slot format: {e}"))?;
    proto::PresetSlot::try_from(slot_num).map_err(|e| e.to_string())
}

fn parse_degree_celsius(s: &str) -> Result<f32, String> {
    let temp_val = s
        .parse::<f32>()
        .map_err(|e| format!("Invalid temperature value format: {e}"))?;
    if temp_val.is_finite() {
        Ok(temp_val)
    } else {
        Err(format!("Invalid temperature value: {s}"))
    }
}

fn parse_operating_mode(s: &str) -> Result<proto::OperatingMode, String> {
    s.parse::<proto::OperatingMode>().map_err(|e| e.to_string())
}

fn parse_remote_mode(s: &str) -> Result<proto::RemoteMode, String> {
    s.parse::<proto::RemoteMode>().map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliConnection {
    /// Connect to a station via its serial remote interface.
    Serial {
        /// Serial port device name.
        /// Examples: "/dev/ttyUSB0" (Linux), "COM3" (Windows).
        #[arg(short, long, default_value_t = default_device_name(), verbatim_doc_comment)]
        device: String,

        /// Commands for the connected station.
        #[command(subcommand)]
        command: CliCommands,
    },
    /// Run against a simulated WX 2 station.
    Demo {
        /// Seed of the simulated temperature noise.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Commands for the simulated station.
        #[command(subcommand)]
        command: CliCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Show station model, firmware, connection socket and tools.
    Info,

    /// Show the current state of both channels.
    Status {
        /// Print the full snapshot as YAML.
        #[arg(long)]
        yaml: bool,
    },

    /// Set the target temperature of a channel.
    SetTemperature {
        /// Channel number (1 or 2).
        #[arg(value_parser = parse_channel)]
        channel: proto::Channel,
        /// Temperature in degrees Celsius (°C), within the configured limits.
        #[arg(value_parser = parse_degree_celsius)]
        temperature: f32,
    },

    /// Set the operating mode of a channel.
    /// The other channel keeps its current mode.
    #[clap(verbatim_doc_comment)]
    SetMode {
        /// Channel number (1 or 2).
        #[arg(value_parser = parse_channel)]
        channel: proto::Channel,
        /// One of OFF, ON, STANDBY, AUTO-OFF.
        #[arg(value_parser = parse_operating_mode)]
        mode: proto::OperatingMode,
    },

    /// Store a preset temperature of a channel.
    SetPreset {
        /// Channel number (1 or 2).
        #[arg(value_parser = parse_channel)]
        channel: proto::Channel,
        /// Preset slot (1 or 2).
        #[arg(value_parser = parse_preset_slot)]
        slot: proto::PresetSlot,
        /// Temperature in degrees Celsius (°C), within the configured limits.
        #[arg(value_parser = parse_degree_celsius)]
        temperature: f32,
    },

    /// Make a stored preset the target temperature of a channel.
    ActivatePreset {
        /// Channel number (1 or 2).
        #[arg(value_parser = parse_channel)]
        channel: proto::Channel,
        /// Preset slot (1 or 2).
        #[arg(value_parser = parse_preset_slot)]
        slot: proto::PresetSlot,
    },

    /// Press the finger switch of a channel's tool.
    Fingerswitch {
        /// Channel number (1 or 2).
        #[arg(value_parser = parse_channel)]
        channel: proto::Channel,
        /// How long the switch is held, in seconds (0 to 9999).
        #[arg(default_value_t = 1)]
        seconds: u32,
    },

    /// Switch the remote control mode.
    /// "enabled-with-lock" also locks the front panel buttons.
    #[clap(verbatim_doc_comment)]
    Remote {
        /// One of disabled, enabled, enabled-with-lock.
        #[arg(value_parser = parse_remote_mode)]
        mode: proto::RemoteMode,
    },

    /// Continuously print temperatures until Ctrl-C is pressed.
    Monitor {
        /// Interval between two printed lines (e.g., "1s", "500ms").
        #[arg(value_parser = humantime::parse_duration, short, long, default_value = "1s")]
        interval: Duration,
    },
}

const fn about_text() -> &'static str {
    "WX soldering station CLI - Control Weller WX stations via their serial remote interface."
}

#[derive(Parser, Debug)]
#[command(name="wxctl", author, version, about=about_text(), long_about = None, propagate_version = true)]
pub struct CliArgs {
    /// Configure verbosity of logging output.
    /// -v for info, -vv for debug, -vvv for trace. Default is off.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Specifies the connection method and station commands.
    #[command(subcommand)]
    pub connection: CliConnection,

    /// YAML configuration file; command line options take precedence.
    #[arg(global = true, short, long)]
    pub config: Option<PathBuf>,

    /// Serial read timeout.
    /// Examples: "2s", "500ms".
    #[arg(global = true, long, value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub timeout: Option<Duration>,

    /// Total attempts for an exchange that got a bad or no answer.
    #[arg(global = true, long)]
    pub attempts: Option<u32>,

    /// Pause between two attempts.
    /// Examples: "1s", "200ms".
    #[arg(global = true, long, value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub retry_delay: Option<Duration>,

    /// Lowest allowed set-point in °C.
    #[arg(global = true, long)]
    pub min_temperature: Option<u16>,

    /// Highest allowed set-point in °C.
    #[arg(global = true, long)]
    pub max_temperature: Option<u16>,
}
