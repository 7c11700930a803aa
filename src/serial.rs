//! Serial port [`Link`] to a real station.

use crate::error::TransportError;
use crate::protocol as proto;
use crate::transport::Link;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

pub const PARITY: &tokio_serial::Parity = &tokio_serial::Parity::None;
pub const STOP_BITS: &tokio_serial::StopBits = &tokio_serial::StopBits::One;
pub const DATA_BITS: &tokio_serial::DataBits = &tokio_serial::DataBits::Eight;

/// Pause after a read that returned no data.
const IDLE_PAUSE: Duration = Duration::from_millis(10);

pub fn serial_port_builder(device: &str, timeout: Duration) -> tokio_serial::SerialPortBuilder {
    tokio_serial::new(device, proto::BAUD_RATE)
        .parity(*PARITY)
        .stop_bits(*STOP_BITS)
        .data_bits(*DATA_BITS)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(timeout)
}

/// A station attached to a serial port.
pub struct SerialLink {
    port: Box<dyn tokio_serial::SerialPort>,
    timeout: Duration,
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.port.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SerialLink {
    /// Opens `device` with the station's fixed line settings.
    ///
    /// `timeout` bounds every response read.
    pub fn open(device: &str, timeout: Duration) -> Result<Self, TransportError> {
        let port = serial_port_builder(device, timeout)
            .open()
            .map_err(|err| TransportError::PortUnavailable(format!("{device}: {err}")))?;
        Ok(Self { port, timeout })
    }
}

fn io_error(err: io::Error) -> TransportError {
    if err.kind() == io::ErrorKind::TimedOut {
        TransportError::Timeout
    } else {
        TransportError::Io(err)
    }
}

/// Reads bytes up to `\n` or `deadline`, whichever comes first.
///
/// `set_timeout` is called before every read with the time left, so a single
/// blocking read never runs past the deadline.
fn read_line_until<R, F>(
    reader: &mut R,
    deadline: Instant,
    mut set_timeout: F,
) -> Result<Vec<u8>, TransportError>
where
    R: Read + ?Sized,
    F: FnMut(&mut R, Duration) -> tokio_serial::Result<()>,
{
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    // A checksum byte of b'\n' (or b'\r' before the terminator) truncates the
    // frame, so such an answer always fails validation.
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        set_timeout(reader, remaining).map_err(|err| TransportError::Io(err.into()))?;
        match reader.read(&mut byte) {
            Ok(0) => std::thread::sleep(IDLE_PAUSE.min(remaining)),
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => line.push(byte[0]),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => break,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

impl Link for SerialLink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        // Drop a late answer to an earlier attempt.
        self.port
            .clear(tokio_serial::ClearBuffer::Input)
            .map_err(|err| TransportError::Io(err.into()))?;
        self.port.write_all(frame).map_err(io_error)?;
        self.port.flush().map_err(io_error)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let deadline = Instant::now() + self.timeout;
        read_line_until(&mut self.port, deadline, |port, remaining| {
            port.set_timeout(remaining)
        })
    }
}
