//! In-process device link.
//!
//! [`pair`] returns the controller's two channel halves together with a
//! [`MemoryDevice`] handle standing in for the device: it injects status
//! bytes, records every command written, and can be told to fail writes.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{ByteSink, ByteSource, Channels};

/// Device side of an in-process link.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    status_tx: Sender<u8>,
    commands: Arc<Mutex<Vec<u8>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryDevice {
    /// Queues a status byte for the controller.
    ///
    /// Returns `false` once the controller's inbound half has been dropped.
    pub fn send_status(&self, byte: u8) -> bool {
        self.status_tx.send(byte).is_ok()
    }

    /// Every command byte written so far, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes every later write on the outbound half fail with `BrokenPipe`.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

/// Controller's inbound half.
#[derive(Debug)]
pub struct MemorySource {
    status_rx: Receiver<u8>,
}

impl ByteSource for MemorySource {
    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        match self.status_rx.recv_timeout(timeout) {
            Ok(byte) => Ok(Some(byte)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device side of the link was dropped",
            )),
        }
    }
}

/// Controller's outbound half.
#[derive(Debug)]
pub struct MemorySink {
    commands: Arc<Mutex<Vec<u8>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemorySink {
    fn check(&self) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device stopped accepting commands",
            ));
        }
        Ok(())
    }
}

impl ByteSink for MemorySink {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.check()?;
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(byte);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check()
    }
}

/// Creates a connected link.
pub fn pair() -> (Channels, MemoryDevice) {
    let (status_tx, status_rx) = mpsc::channel();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let fail_writes = Arc::new(AtomicBool::new(false));

    let channels = Channels::new(
        MemorySource { status_rx },
        MemorySink {
            commands: Arc::clone(&commands),
            fail_writes: Arc::clone(&fail_writes),
        },
    );
    let device = MemoryDevice {
        status_tx,
        commands,
        fail_writes,
    };
    (channels, device)
}
