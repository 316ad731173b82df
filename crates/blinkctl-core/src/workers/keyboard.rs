//! Keyboard worker: keystrokes in, device commands out.

use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::channel::ByteSink;
use crate::protocol::KeyAction;
use crate::state::SharedState;

/// One unit of keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Byte(u8),
    /// The input stream is closed; no more keys will arrive.
    EndOfInput,
}

/// Source of keystrokes.
pub trait KeySource: Send {
    /// Waits up to `timeout` for the next key. `Ok(None)` means none arrived.
    ///
    /// # Errors
    /// Returns an error if the input device fails.
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>>;
}

/// Keys fed from another thread. A dropped sender reads as end of input.
impl KeySource for Receiver<u8> {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        match self.recv_timeout(timeout) {
            Ok(byte) => Ok(Some(KeyInput::Byte(byte))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Ok(Some(KeyInput::EndOfInput)),
        }
    }
}

enum Step {
    Continue,
    Stop,
}

/// Runs until quit is latched, `q` is typed, input ends, or a write fails.
///
/// The key read happens outside the lock. Everything after it, including the
/// write to the device, happens inside one [`SharedState::update`], so no
/// command can be forwarded once quit has been latched.
///
/// # Errors
/// Returns an error if reading keys or writing to the device fails. Quit is
/// latched first in both cases.
pub fn run(
    state: &SharedState,
    keys: &mut dyn KeySource,
    sink: &mut dyn ByteSink,
    poll_timeout: Duration,
) -> Result<()> {
    loop {
        if state.is_quit() {
            return Ok(());
        }

        let byte = match keys.next_key(poll_timeout) {
            Ok(None) => continue,
            Ok(Some(KeyInput::Byte(byte))) => byte,
            Ok(Some(KeyInput::EndOfInput)) => {
                tracing::debug!("keyboard input closed");
                state.request_quit();
                return Ok(());
            }
            Err(err) => {
                state.request_quit();
                return Err(err).context("Failed to read keyboard");
            }
        };

        let step = state.update(|s| -> io::Result<Step> {
            if s.quit {
                return Ok(Step::Stop);
            }
            match KeyAction::from_key(byte) {
                KeyAction::Forward(command) => {
                    if let Err(err) = sink.write_byte(command).and_then(|()| sink.flush()) {
                        s.quit = true;
                        return Err(err);
                    }
                    s.send_char = command;
                    Ok(Step::Continue)
                }
                KeyAction::Quit => {
                    s.quit = true;
                    Ok(Step::Stop)
                }
                KeyAction::Ignore => Ok(Step::Continue),
            }
        });

        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Stop) => {
                tracing::debug!("keyboard worker stopping");
                return Ok(());
            }
            Err(err) => {
                tracing::error!(command = %char::from(byte), error = %err, "send to device failed");
                return Err(err)
                    .with_context(|| format!("Failed to send '{}' to device", char::from(byte)));
            }
        }
    }
}
