//! Exclusive, retrying access to the link a station is attached to.
//!
//! A [`Link`] moves raw frames; a real serial port and the simulated station
//! are the two implementations. [`TransportSession`] wraps one link and
//! performs complete write/read/validate exchanges, one at a time, retrying the
//! ones that failed because of a bad answer.

use crate::codec::{self, Command, ResponseKind};
use crate::error::{ProtocolError, Result, TransportError};
use log::*;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A half-duplex byte link to a station.
pub trait Link: Send {
    /// Writes one complete frame.
    fn write_frame(&mut self, frame: &[u8]) -> std::result::Result<(), TransportError>;

    /// Reads one response line without its line terminator.
    ///
    /// Returns an empty buffer if nothing arrived before the link's timeout.
    fn read_line(&mut self) -> std::result::Result<Vec<u8>, TransportError>;
}

/// How often an exchange with a retryable failure is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    #[cfg_attr(feature = "serde", serde(default = "default_attempts"))]
    pub attempts: u32,
    /// Pause between two attempts.
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_delay", with = "humantime_serde")
    )]
    pub delay: Duration,
}

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[cfg(feature = "serde")]
fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

#[cfg(feature = "serde")]
fn default_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Owns a link and serializes every exchange on it.
///
/// The link lock is held for exactly one attempt (write, read and validation)
/// and released while waiting between retries, so a poller and any number of
/// command callers can share one session.
pub struct TransportSession {
    link: Mutex<Box<dyn Link>>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl TransportSession {
    pub fn new(link: Box<dyn Link>, retry: RetryPolicy) -> Self {
        Self {
            link: Mutex::new(link),
            retry,
        }
    }

    /// Encodes `command` and exchanges it, expecting the command's response layout.
    pub fn execute(&self, command: &Command) -> Result<Option<Vec<u8>>> {
        let frame = command.encode()?;
        let kind = command.response_kind();
        self.exchange(&frame, kind.is_some(), kind)
    }

    /// Writes `frame` and, if `expect_response`, reads and validates one response.
    ///
    /// With a `kind`, the response must reach the kind's minimum length and carry
    /// its prefix; the checksum is checked in any case. Protocol failures are
    /// retried according to the session's [`RetryPolicy`] and the last one is
    /// returned; transport failures are returned at once.
    pub fn exchange(
        &self,
        frame: &[u8],
        expect_response: bool,
        kind: Option<ResponseKind>,
    ) -> Result<Option<Vec<u8>>> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.exchange_once(frame, expect_response, kind) {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(
                        "Exchange of {:?} failed (attempt {attempt}/{attempts}): {err}",
                        String::from_utf8_lossy(frame)
                    );
                    std::thread::sleep(self.retry.delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn exchange_once(
        &self,
        frame: &[u8],
        expect_response: bool,
        kind: Option<ResponseKind>,
    ) -> Result<Option<Vec<u8>>> {
        let mut link = self.link.lock().unwrap_or_else(PoisonError::into_inner);

        debug!("Sending frame: {:?}", String::from_utf8_lossy(frame));
        link.write_frame(frame)?;
        if !expect_response {
            return Ok(None);
        }

        let response = link.read_line()?;
        if response.is_empty() {
            return Err(ProtocolError::NoResponse.into());
        }
        debug!("Raw response: {:?}", String::from_utf8_lossy(&response));

        let prefix: &[u8] = match kind {
            Some(kind) => {
                if response.len() < kind.min_len() {
                    return Err(ProtocolError::TooShort {
                        expected: kind.min_len(),
                        actual: response.len(),
                    }
                    .into());
                }
                kind.prefix()
            }
            None => b"",
        };
        codec::validate(&response, prefix)?;
        Ok(Some(response))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted link that records what it was sent.

    use super::Link;
    use crate::codec::with_checksum;
    use crate::error::TransportError;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};

    enum Reply {
        Line(Vec<u8>),
        Fail(io::ErrorKind),
    }

    #[derive(Default)]
    struct Script {
        writes: Vec<Vec<u8>>,
        replies: VecDeque<Reply>,
        reads: usize,
    }

    /// Replays queued replies in order; an empty queue reads as a timeout.
    #[derive(Clone, Default)]
    pub struct ScriptedLink {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedLink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a raw reply.
        pub fn reply_raw(&self, raw: &[u8]) -> &Self {
            self.script
                .lock()
                .unwrap()
                .replies
                .push_back(Reply::Line(raw.to_vec()));
            self
        }

        /// Queues a reply with a correct checksum appended.
        pub fn reply(&self, body: &str) -> &Self {
            self.reply_raw(&with_checksum(body.as_bytes().to_vec()).unwrap())
        }

        /// Queues an I/O failure.
        pub fn fail(&self, kind: io::ErrorKind) -> &Self {
            self.script
                .lock()
                .unwrap()
                .replies
                .push_back(Reply::Fail(kind));
            self
        }

        pub fn writes(&self) -> Vec<Vec<u8>> {
            self.script.lock().unwrap().writes.clone()
        }

        pub fn reads(&self) -> usize {
            self.script.lock().unwrap().reads
        }

        pub fn pending(&self) -> usize {
            self.script.lock().unwrap().replies.len()
        }
    }

    impl Link for ScriptedLink {
        fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            self.script.lock().unwrap().writes.push(frame.to_vec());
            Ok(())
        }

        fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
            let mut script = self.script.lock().unwrap();
            script.reads += 1;
            match script.replies.pop_front() {
                Some(Reply::Line(line)) => Ok(line),
                Some(Reply::Fail(kind)) => Err(TransportError::Io(io::Error::from(kind))),
                None => Ok(Vec::new()),
            }
        }
    }
}
