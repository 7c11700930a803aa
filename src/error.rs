//! Error types for the WX station protocol engine.
//!
//! Errors are grouped by how the session reacts to them:
//!
//! * [`ConfigError`] is raised while building a session, before any I/O.
//! * [`ValidationError`] rejects a request before the link is touched.
//! * [`ProtocolError`] describes a bad or missing response. These are retryable.
//! * [`TransportError`] means the link itself failed. These are fatal and never retried.

/// Invalid session configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The temperature limits violate `0 <= min < max <= 550`.
    #[error("Invalid temperature limits {min}..={max} °C, expected 0 <= min < max <= {ceiling}")]
    InvalidLimits { min: u16, max: u16, ceiling: u16 },

    /// The retry policy must allow at least one attempt.
    #[error("Retry attempts must be at least 1")]
    ZeroAttempts,

    /// The history buffer must hold at least one sample.
    #[error("History capacity must be at least 1")]
    ZeroHistoryCapacity,

    /// The poll interval must not be zero.
    #[error("Poll interval must not be zero")]
    ZeroPollInterval,

    /// The configuration file could not be read.
    #[error("Cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[cfg(feature = "serde")]
    #[error("Cannot parse configuration file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A request that was rejected before any transport access.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A temperature outside the configured limits.
    #[error("Temperature {value} °C is outside the allowed range {min}..={max} °C")]
    OutOfRange { value: f32, min: u16, max: u16 },

    /// A channel number other than 1 or 2.
    #[error("Invalid channel {0}, expected 1 or 2")]
    InvalidChannel(u8),

    /// An operating mode that does not exist.
    #[error("Invalid operating mode '{0}'")]
    InvalidMode(String),

    /// A preset slot other than 1 or 2.
    #[error("Invalid preset slot {0}, expected 1 or 2")]
    InvalidPresetSlot(u8),

    /// A numeric payload that does not fit its fixed-width wire field.
    #[error("Value {value} does not fit the {width}-digit field of command '{opcode}'")]
    ValueOutOfRange {
        opcode: char,
        value: f64,
        width: usize,
    },

    /// Checksum requested over empty data.
    #[error("Cannot compute a checksum over empty data")]
    EmptyInput,
}

/// A response that failed validation or decoding.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The station did not answer within the read timeout.
    #[error("No response received")]
    NoResponse,

    /// The response is shorter than the layout requires.
    #[error("Response too short: got {actual} bytes, expected at least {expected}")]
    TooShort { expected: usize, actual: usize },

    /// The response does not start with the expected prefix.
    #[error("Expected response prefix {expected:?}, got {actual:?}")]
    PrefixMismatch { expected: String, actual: String },

    /// The trailing checksum byte does not match the payload.
    #[error("Checksum mismatch: received 0x{received:02X}, calculated 0x{calculated:02X}")]
    ChecksumMismatch { received: u8, calculated: u8 },

    /// A field has unexpected content.
    #[error("Malformed {field} field: {content:?}")]
    FormatError { field: &'static str, content: String },
}

/// A failure of the physical link.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The serial port could not be opened or has been closed.
    #[error("Serial port unavailable: {0}")]
    PortUnavailable(String),

    /// A write did not complete in time.
    #[error("Serial I/O timed out")]
    Timeout,

    /// Any other I/O failure.
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Represents all possible errors of the station engine.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Wraps [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Wraps [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wraps [`ProtocolError`].
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Wraps [`TransportError`].
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Whether the failed exchange may be attempted again.
    ///
    /// Only protocol errors qualify: the link is intact and the next answer
    /// may well be clean. Everything else either never reached the link or
    /// broke it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

/// The result type for station operations.
pub type Result<T> = std::result::Result<T, Error>;
