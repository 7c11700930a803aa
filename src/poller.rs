//! Background refresh of a [`StationState`].

use crate::commands::WxStation;
use crate::error::Result;
use crate::state::StationState;
use crate::transport::TransportSession;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::*;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Polls the station once: modes, temperatures and tools, then optionally the
/// set-points and presets.
pub fn poll_once(
    session: &TransportSession,
    state: &StationState,
    refresh_settings: bool,
) -> Result<()> {
    let mark = state.mark();
    let poll = WxStation::poll(session)?;
    state.update(&poll, mark);
    if refresh_settings {
        let settings = WxStation::read_settings(session)?;
        state.update_settings(&settings, mark);
    }
    Ok(())
}

/// Whether tick number `tick` also refreshes the settings.
fn settings_due(tick: u64, settings_refresh_ticks: u32) -> bool {
    settings_refresh_ticks != 0 && tick % u64::from(settings_refresh_ticks) == 0
}

/// A running poll thread.
///
/// Failed ticks are logged and skipped; the state then simply keeps its last
/// values. The thread is stopped between ticks, never in the middle of an
/// exchange.
#[derive(Debug)]
pub struct Poller {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Starts polling every `interval`, beginning immediately.
    pub fn spawn(
        session: Arc<TransportSession>,
        state: Arc<StationState>,
        interval: Duration,
        settings_refresh_ticks: u32,
    ) -> std::io::Result<Self> {
        let (shutdown, shutdown_rx) = bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name("wx-poller".into())
            .spawn(move || {
                debug!("Poller started with interval {interval:?}");
                let mut tick: u64 = 0;
                loop {
                    let refresh_settings = settings_due(tick, settings_refresh_ticks);
                    if let Err(err) = poll_once(&session, &state, refresh_settings) {
                        warn!("Poll failed: {err}");
                    }
                    tick = tick.wrapping_add(1);
                    match shutdown_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Poller stopped after {tick} ticks");
            })?;
        Ok(Self {
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the thread and waits for the current tick to finish.
    pub fn stop(&mut self) {
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Poller thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
