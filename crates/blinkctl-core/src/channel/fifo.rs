//! Named-pipe channel endpoints.
//!
//! The inbound pipe is opened read-write and non-blocking: opening never
//! waits for the device, and holding a write end ourselves means the pipe
//! never reports end-of-file when the device restarts. The outbound pipe is
//! opened write-only and blocks until the device opens its read end.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::Duration;

use super::{ByteSink, ByteSource, ChannelOpenError, Channels};

/// Inbound named pipe.
#[derive(Debug)]
pub struct FifoSource {
    file: File,
}

impl FifoSource {
    /// # Errors
    /// Returns [`ChannelOpenError`] if the pipe cannot be opened.
    pub fn open(path: &Path) -> Result<Self, ChannelOpenError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(path)
            .map_err(|source| ChannelOpenError {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { file })
    }
}

impl ByteSource for FifoSource {
    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        let mut fds = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: `fds` is a single valid pollfd that outlives the call.
        let ready = unsafe { libc::poll(&raw mut fds, 1, timeout_ms) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(None);
            }
            return Err(err);
        }
        if ready == 0 {
            return Ok(None);
        }
        if fds.revents & (libc::POLLERR | libc::POLLNVAL) != 0 {
            return Err(io::Error::other("inbound pipe reported an error"));
        }

        let mut buf = [0u8; 1];
        match self.file.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Outbound named pipe.
#[derive(Debug)]
pub struct FifoSink {
    file: File,
}

impl FifoSink {
    /// Blocks until the device opens the read end.
    ///
    /// # Errors
    /// Returns [`ChannelOpenError`] if the pipe cannot be opened.
    pub fn open(path: &Path) -> Result<Self, ChannelOpenError> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_SYNC)
            .open(path)
            .map_err(|source| ChannelOpenError {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { file })
    }
}

impl ByteSink for FifoSink {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.file.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Opens the inbound pipe, then the outbound one.
///
/// # Errors
/// Returns the first endpoint that fails to open.
pub fn open_pair(input: &Path, output: &Path) -> Result<Channels, ChannelOpenError> {
    let source = FifoSource::open(input)?;
    tracing::info!(path = %input.display(), "opened inbound pipe");
    let sink = FifoSink::open(output)?;
    tracing::info!(path = %output.display(), "opened outbound pipe");
    Ok(Channels::new(source, sink))
}
