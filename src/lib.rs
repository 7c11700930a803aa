//! A library for controlling Weller WX soldering stations over their serial remote interface.
//!
//! The crate is organized in layers, from the wire upwards:
//!
//! 1.  **Protocol and codec**: typed values ([`protocol`]) and the checksummed
//!     ASCII frames that carry them ([`codec`]).
//! 2.  **Transport**: a [`transport::Link`] to a real ([`serial`]) or simulated
//!     ([`simulator`]) station, wrapped by a [`transport::TransportSession`] that
//!     serializes exchanges and retries bad answers.
//! 3.  **Low-level commands**: stateless functions mapping each wire operation to
//!     a typed call. See [`commands::WxStation`].
//! 4.  **Station session**: [`station::Station`] keeps a thread-safe model of
//!     the station ([`state`]) up to date with a background [`poller`] and
//!     validates requests before they reach the wire. This is the recommended
//!     entry point for most users.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wxstation_lib::{config::StationConfig, protocol::{Channel, OperatingMode}, station::Station};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let station = Station::open_serial("/dev/ttyUSB0", StationConfig::default())?;
//!     station.connect()?;
//!
//!     station.set_temperature(Channel::ONE, 330.0)?;
//!     station.set_mode(Channel::TWO, OperatingMode::Standby)?;
//!
//!     let snapshot = station.snapshot();
//!     println!("Channel 1 at {:?} °C", snapshot.channel(Channel::ONE).temperature);
//!
//!     station.close();
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod poller;
pub mod protocol;
pub mod simulator;
pub mod state;
pub mod station;
pub mod transport;

#[cfg_attr(docsrs, doc(cfg(feature = "serial")))]
#[cfg(feature = "serial")]
pub mod serial;
