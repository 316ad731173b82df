//! Device-event worker: status bytes in, shared state updated.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::channel::ByteSource;
use crate::protocol::{Status, printable};
use crate::state::SharedState;

/// Polls the inbound channel until quit is latched.
///
/// Each received byte is applied through [`SharedState::update`], which
/// signals the display before the lock is released. A `b` from the device
/// latches quit from inside that same update. Bytes arriving after quit are
/// dropped.
///
/// # Errors
/// Returns an error on a hard read failure, after latching quit.
pub fn run(state: &SharedState, source: &mut dyn ByteSource, poll_timeout: Duration) -> Result<()> {
    while !state.is_quit() {
        match source.read_byte_timeout(poll_timeout) {
            Ok(None) => {}
            Ok(Some(byte)) => {
                let status = state.update(|s| (!s.quit).then(|| s.apply_status(byte)));
                match status {
                    Some(Status::Bye) => tracing::info!("device is shutting down"),
                    Some(status) => {
                        tracing::trace!(byte = %printable(byte), ?status, "status received");
                    }
                    None => tracing::debug!(byte = %printable(byte), "status dropped after quit"),
                }
            }
            Err(err) => {
                state.request_quit();
                tracing::error!(error = %err, "inbound channel failed");
                return Err(err).context("Failed to read from device");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::thread;

    use super::*;
    use crate::channel::memory;

    const POLL: Duration = Duration::from_millis(5);

    struct Failing;

    impl ByteSource for Failing {
        fn read_byte_timeout(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
            Err(io::Error::other("boom"))
        }
    }

    #[test]
    fn test_bye_stops_worker_with_reset_state() {
        let state = SharedState::new();
        let (mut channels, device) = memory::pair();
        for byte in *b"xoxb" {
            device.send_status(byte);
        }

        run(&state, channels.source.as_mut(), POLL).unwrap();

        let snap = state.snapshot();
        assert!(snap.quit);
        assert!(!snap.led);
        assert_eq!(snap.alarm_counter, 0);
        assert_eq!(snap.alarm_period, 0);
        assert_eq!(snap.received_char, b'b');
    }

    #[test]
    fn test_toggles_accumulate() {
        let state = SharedState::new();
        let (mut channels, device) = memory::pair();

        let worker = {
            let state = &state;
            let source = channels.source.as_mut();
            thread::scope(|scope| {
                let handle = scope.spawn(move || run(state, source, POLL));
                for byte in *b"xok" {
                    device.send_status(byte);
                }
                while state.snapshot().received_char != b'k' {
                    thread::sleep(POLL);
                }
                state.request_quit();
                handle.join().unwrap()
            })
        };
        worker.unwrap();

        let snap = state.snapshot();
        assert_eq!(snap.alarm_counter, 2);
        assert!(!snap.led);
        assert_eq!(snap.received_char, b'k');
    }

    #[test]
    fn test_read_failure_latches_quit() {
        let state = SharedState::new();
        let err = run(&state, &mut Failing, POLL).unwrap_err();
        assert!(state.is_quit());
        assert!(format!("{err:#}").contains("boom"));
    }

    #[test]
    fn test_bytes_after_quit_are_dropped() {
        let state = SharedState::new();
        state.request_quit();
        let (mut channels, device) = memory::pair();
        device.send_status(b'x');

        run(&state, channels.source.as_mut(), POLL).unwrap();
        assert_eq!(state.snapshot().alarm_counter, 0);
    }
}
