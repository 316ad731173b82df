//! Byte channels to the LED device.
//!
//! The device is reached through two half-duplex byte streams: an outbound
//! [`ByteSink`] written only by the keyboard worker and an inbound
//! [`ByteSource`] read only by the device-event worker. Neither needs a lock
//! of its own.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(unix)]
pub mod fifo;
pub mod memory;

/// Outbound half: blocking single-byte writes.
pub trait ByteSink: Send {
    /// Writes one byte.
    ///
    /// # Errors
    /// Returns an error if the device end is gone or the write fails.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Pushes any buffered bytes to the device.
    ///
    /// # Errors
    /// Returns an error if the underlying flush fails.
    fn flush(&mut self) -> io::Result<()>;
}

/// Inbound half: single-byte reads bounded by a timeout.
pub trait ByteSource: Send {
    /// Reads one byte, waiting at most `timeout`.
    ///
    /// `Ok(None)` means nothing arrived in time; it is the normal poll outcome.
    ///
    /// # Errors
    /// Returns an error on a hard channel failure.
    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>>;
}

/// Both halves of an open device link.
pub struct Channels {
    pub source: Box<dyn ByteSource>,
    pub sink: Box<dyn ByteSink>,
}

impl Channels {
    pub fn new(source: impl ByteSource + 'static, sink: impl ByteSink + 'static) -> Self {
        Self {
            source: Box::new(source),
            sink: Box::new(sink),
        }
    }
}

/// A channel endpoint could not be opened.
#[derive(Debug)]
pub struct ChannelOpenError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl std::fmt::Display for ChannelOpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cannot open named pipe port {}", self.path.display())
    }
}

impl std::error::Error for ChannelOpenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
