//! WX soldering station CLI
//!
//! A command-line interface (CLI) application for controlling Weller WX
//! soldering stations through their serial remote interface, or a simulated
//! station for trying things out.
//!
//! This tool allows users to:
//! - Show the station model, firmware, connection socket and tools.
//! - Show the state of both channels, optionally as YAML.
//! - Set temperatures, operating modes and presets, and activate presets.
//! - Trigger the finger switch of a tool.
//! - Switch the remote control mode.
//! - Continuously monitor temperatures until Ctrl-C is pressed.
//!
//! The CLI leverages the `wxstation_lib` crate for the protocol and the station session.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use dialoguer::Confirm;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use std::panic;
use wxstation_lib::{
    config::StationConfig, protocol as proto, state::StationSnapshot, station::Station,
};

mod commandline;

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown_file>", 0, 0));

        let cause_str = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "<unknown_panic_cause>"
        };

        error!(
            target: "panic",
            "Thread '{}' panicked at '{}': {}:{} - Cause: {}",
            std::thread::current().name().unwrap_or("<unnamed>"),
            filename,
            line,
            column,
            cause_str
        );
    }));
    log_handle
}

/// Builds the session configuration from the optional file and the command line overrides.
fn load_config(args: &commandline::CliArgs) -> Result<StationConfig> {
    let mut config = match &args.config {
        Some(path) => StationConfig::from_yaml_file(path)
            .with_context(|| format!("Cannot load configuration from {}", path.display()))?,
        None => StationConfig::default(),
    };
    apply_overrides(&mut config, args);
    config
        .validate()
        .with_context(|| "Invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut StationConfig, args: &commandline::CliArgs) {
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if let Some(attempts) = args.attempts {
        config.retry.attempts = attempts;
    }
    if let Some(delay) = args.retry_delay {
        config.retry.delay = delay;
    }
    if let Some(min) = args.min_temperature {
        config.limits.min = min;
    }
    if let Some(max) = args.max_temperature {
        config.limits.max = max;
    }
}

/// Creates the station session based on the provided command-line arguments.
fn create_station(
    connection: &commandline::CliConnection,
    config: StationConfig,
) -> Result<(Station, &commandline::CliCommands)> {
    match connection {
        commandline::CliConnection::Serial { device, command } => {
            info!("Opening serial port {device}...");
            let station = Station::open_serial(device, config)
                .with_context(|| format!("Cannot open station on {device}"))?;
            Ok((station, command))
        }
        commandline::CliConnection::Demo { seed, command } => {
            info!("Starting simulated station with seed {seed}");
            let station = Station::simulated(*seed, config)
                .with_context(|| "Cannot create simulated station")?;
            Ok((station, command))
        }
    }
}

fn format_temperature(value: Option<f32>) -> String {
    value.map_or_else(|| String::from("--"), |value| format!("{value:.1} °C"))
}

fn format_channel(channel: proto::Channel, snapshot: &StationSnapshot) -> String {
    let state = snapshot.channel(channel);
    format!(
        "CH{channel}: {:<8} {:>9} (set {}, presets {} / {}) tool {}",
        state
            .mode
            .map_or_else(|| String::from("--"), |mode| mode.to_string()),
        format_temperature(state.temperature),
        format_temperature(state.set_point),
        format_temperature(state.preset1),
        format_temperature(state.preset2),
        state
            .tool
            .map_or_else(|| String::from("--"), |tool| tool.to_string()),
    )
}

fn print_status(snapshot: &StationSnapshot) {
    for channel in proto::Channel::ALL {
        println!("{}", format_channel(channel, snapshot));
    }
}

fn print_info(station: &Station) {
    let snapshot = station.snapshot();
    println!(
        "Model: {}",
        snapshot
            .unit_model
            .map_or_else(|| String::from("unknown"), |model| model.to_string())
    );
    match &snapshot.firmware {
        Some(firmware) if firmware.is_compatible() => println!("Firmware: {firmware}"),
        Some(firmware) => println!("Firmware: {firmware} (outdated, some commands may fail)"),
        None => println!("Firmware: unknown"),
    }
    println!(
        "Connection: {}",
        snapshot
            .connection_type
            .map_or_else(|| String::from("unknown"), |c| c.to_string())
    );
    println!("Remote mode: {}", snapshot.remote_mode);
    println!(
        "Limits: {}..={} °C",
        snapshot.limits.min, snapshot.limits.max
    );
    for channel in proto::Channel::ALL {
        match station.tool_info(channel) {
            Some(tool) => println!(
                "Tool CH{channel}: {} - {}{} (max {} °C)",
                tool.name,
                tool.description,
                tool.power_watts
                    .map_or_else(String::new, |watts| format!(", {watts} W")),
                tool.max_temperature
            ),
            None => println!("Tool CH{channel}: unknown"),
        }
    }
}

/// Prints both channels every `interval` until Ctrl-C is pressed.
fn monitor(station: &Station, interval: std::time::Duration) -> Result<()> {
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("Cannot install Ctrl-C handler")?;

    station
        .start_polling()
        .with_context(|| "Cannot start polling")?;
    loop {
        let snapshot = station.snapshot();
        println!(
            "{} | {}",
            format_channel(proto::Channel::ONE, &snapshot),
            format_channel(proto::Channel::TWO, &snapshot)
        );
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    for channel in proto::Channel::ALL {
        if let Some(stats) = station.history_statistics(channel) {
            println!(
                "CH{channel}: {} samples, min {:.1} °C, max {:.1} °C, avg {:.1} °C",
                stats.count, stats.min, stats.max, stats.avg
            );
        }
    }
    Ok(())
}

fn execute(station: &Station, command: &commandline::CliCommands) -> Result<()> {
    match command {
        commandline::CliCommands::Info => {
            info!("Executing: Info");
            print_info(station);
        }
        commandline::CliCommands::Status { yaml } => {
            info!("Executing: Status");
            let snapshot = station.snapshot();
            if *yaml {
                print!(
                    "{}",
                    serde_yaml::to_string(&snapshot).context("Cannot serialize status")?
                );
            } else {
                print_status(&snapshot);
            }
        }
        commandline::CliCommands::SetTemperature {
            channel,
            temperature,
        } => {
            info!("Executing: Set Temperature for Channel {channel} to {temperature} °C");
            station
                .set_temperature(*channel, *temperature)
                .with_context(|| {
                    format!("Failed to set temperature of channel {channel} to {temperature} °C")
                })?;
            println!("Temperature of channel {channel} set to {temperature} °C successfully.");
        }
        commandline::CliCommands::SetMode { channel, mode } => {
            info!("Executing: Set Mode for Channel {channel} to {mode}");
            let modes = station
                .set_mode(*channel, *mode)
                .with_context(|| format!("Failed to set mode of channel {channel} to {mode}"))?;
            println!("Modes set to {modes}.");
        }
        commandline::CliCommands::SetPreset {
            channel,
            slot,
            temperature,
        } => {
            info!("Executing: Set Preset {slot} for Channel {channel} to {temperature} °C");
            station
                .set_preset(*channel, *slot, *temperature)
                .with_context(|| {
                    format!("Failed to set preset {slot} of channel {channel} to {temperature} °C")
                })?;
            println!("Preset {slot} of channel {channel} set to {temperature} °C successfully.");
        }
        commandline::CliCommands::ActivatePreset { channel, slot } => {
            info!("Executing: Activate Preset {slot} for Channel {channel}");
            let temperature = station
                .activate_preset(*channel, *slot)
                .with_context(|| format!("Failed to activate preset {slot} of channel {channel}"))?;
            println!("Channel {channel} now targets preset {slot} ({temperature} °C).");
        }
        commandline::CliCommands::Fingerswitch { channel, seconds } => {
            info!("Executing: Fingerswitch for Channel {channel} ({seconds} s)");
            station
                .trigger_fingerswitch(*channel, *seconds)
                .with_context(|| format!("Failed to trigger finger switch of channel {channel}"))?;
            println!("Finger switch of channel {channel} triggered for {seconds} s.");
        }
        commandline::CliCommands::Remote { mode } => {
            info!("Executing: Remote Mode {mode}");
            if mode.button_lock()
                && !Confirm::new()
                    .with_prompt("This locks the station's front panel buttons. Continue?")
                    .default(false)
                    .show_default(true)
                    .interact()
                    .context("Failed to get user confirmation.")?
            {
                info!("Remote mode change aborted by user.");
                return Ok(());
            }
            let connection = station
                .set_remote_mode(*mode)
                .with_context(|| format!("Failed to switch remote mode to {mode}"))?;
            match connection {
                Some(connection) => println!("Remote mode {mode} ({connection} socket)."),
                None => println!("Remote mode {mode}."),
            }
        }
        commandline::CliCommands::Monitor { interval } => {
            info!("Executing: Monitor every {interval:?}");
            monitor(station, *interval)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = commandline::CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter());
    info!(
        "WX station CLI started. Log level: {}",
        args.verbose.log_level_filter()
    );

    let config = load_config(&args)?;
    let (station, command) = create_station(&args.connection, config)?;
    station
        .handshake()
        .with_context(|| "Cannot connect to the station")?;

    let result = execute(&station, command);
    let keep_remote = matches!(
        command,
        commandline::CliCommands::Remote { mode } if *mode != proto::RemoteMode::Disabled
    );
    if keep_remote {
        station.stop_polling();
    } else {
        station.close();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn overrides_replace_file_values() {
        let args = commandline::CliArgs::parse_from([
            "wxctl",
            "demo",
            "info",
            "--attempts",
            "5",
            "--retry-delay",
            "250ms",
            "--min-temperature",
            "100",
        ]);
        let mut config = StationConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.limits.min, 100);
        assert_eq!(config.limits.max, 450);
        assert_eq!(config.timeout, StationConfig::default().timeout);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let args = commandline::CliArgs::parse_from([
            "wxctl",
            "demo",
            "info",
            "--min-temperature",
            "400",
            "--max-temperature",
            "300",
        ]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn temperatures_are_formatted() {
        assert_eq!(format_temperature(None), "--");
        assert_eq!(format_temperature(Some(250.04)), "250.0 °C");
    }

    #[test]
    fn demo_session_runs_commands() {
        let args = commandline::CliArgs::parse_from(["wxctl", "demo", "set-temperature", "1", "300"]);
        let config = load_config(&args).unwrap();
        let (station, command) = create_station(&args.connection, config).unwrap();
        station.handshake().unwrap();
        execute(&station, command).unwrap();
        assert_eq!(
            station.snapshot().channel(proto::Channel::ONE).set_point,
            Some(300.0)
        );
        let line = format_channel(proto::Channel::ONE, &station.snapshot());
        assert!(line.starts_with("CH1: ON"), "{line}");
        station.close();
    }
}
