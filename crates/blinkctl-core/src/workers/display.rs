//! Display worker: redraws one status line whenever the record changes.

use std::io::Write;

use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::protocol::printable;
use crate::state::{SharedState, Snapshot};

/// Formats the status line for one snapshot.
pub fn status_line(snap: &Snapshot) -> String {
    format!(
        "LED {:>3} |send: '{}'|received: '{}'|T = {:4} ms|cycles = {:4}",
        if snap.led { "on" } else { "off" },
        printable(snap.send_char),
        printable(snap.received_char),
        snap.alarm_period,
        snap.cycles(),
    )
}

fn render<W: Write>(out: &mut W, snap: &Snapshot) -> std::io::Result<()> {
    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(status_line(snap))
    )?;
    out.flush()
}

/// Renders, then sleeps on the condition variable until the next change.
///
/// Never mutates the record except to latch quit when the output fails.
/// Returns once a wake-up observes quit.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn run<W: Write>(state: &SharedState, out: &mut W) -> Result<()> {
    let mut snap = state.snapshot();
    while !snap.quit {
        if let Err(err) = render(out, &snap) {
            state.request_quit();
            return Err(err).context("Failed to render status line");
        }
        snap = state.wait_for_change(snap.version);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_status_line_initial() {
        assert_eq!(
            status_line(&Snapshot::default()),
            "LED off |send: ' '|received: '?'|T =    0 ms|cycles =    0"
        );
    }

    #[test]
    fn test_status_line_running() {
        let snap = Snapshot {
            led: true,
            send_char: b's',
            received_char: b'x',
            alarm_period: 250,
            alarm_counter: 6,
            ..Snapshot::default()
        };
        assert_eq!(
            status_line(&snap),
            "LED  on |send: 's'|received: 'x'|T =  250 ms|cycles =    3"
        );
    }

    #[test]
    fn test_redraws_on_change_and_exits_on_quit() {
        let state = Arc::new(SharedState::new());
        let buf = SharedBuf::default();

        let worker = {
            let state = Arc::clone(&state);
            let mut out = buf.clone();
            thread::spawn(move || run(&state, &mut out))
        };

        state.update(|s| s.send_char = b's');
        while !buf.text().contains("send: 's'") {
            thread::sleep(Duration::from_millis(2));
        }
        state.request_quit();

        worker.join().unwrap().unwrap();
        assert!(buf.text().contains("LED off"));
    }

    #[test]
    fn test_no_render_once_quit() {
        let state = SharedState::new();
        state.request_quit();
        let mut out = Vec::new();
        run(&state, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_output_failure_latches_quit() {
        let state = SharedState::new();
        assert!(run(&state, &mut Broken).is_err());
        assert!(state.is_quit());
    }
}
