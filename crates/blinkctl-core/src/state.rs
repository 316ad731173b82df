//! The single record shared by all workers.
//!
//! [`SharedState`] owns the record behind one mutex and one condition
//! variable. Nothing outside this module can touch a field without holding
//! the lock: readers get a [`Snapshot`] copy, writers go through
//! [`SharedState::update`], which always signals the condition variable in
//! the same critical section as the mutation.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::protocol::{CMD_START, CMD_STOP, RECEIVED_SENTINEL, SEND_SENTINEL, Status};

/// Copy of the shared record taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// LED state as last reported by the device.
    pub led: bool,
    /// Last command byte sent to the device.
    pub send_char: u8,
    /// Last status byte received from the device.
    pub received_char: u8,
    /// Average toggle interval over the last window in ms. 0 means no toggles.
    pub alarm_period: u32,
    /// Toggle events since the last window reset.
    pub alarm_counter: u32,
    /// Quit latch. Never goes back to false.
    pub quit: bool,
    /// Bumped on every mutation; lets waiters tell a real change from a spurious wake-up.
    pub version: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            led: false,
            send_char: SEND_SENTINEL,
            received_char: RECEIVED_SENTINEL,
            alarm_period: 0,
            alarm_counter: 0,
            quit: false,
            version: 0,
        }
    }
}

impl Snapshot {
    /// Applies one status byte from the device and returns how it was decoded.
    ///
    /// `received_char` is recorded for every byte, whichever branch fires.
    pub fn apply_status(&mut self, byte: u8) -> Status {
        let status = Status::from_byte(byte);
        match status {
            Status::Bye => {
                self.reset_period();
                self.led = false;
                self.quit = true;
            }
            Status::LedOn => {
                self.led = true;
                self.alarm_counter = self.alarm_counter.saturating_add(1);
            }
            Status::LedOff => {
                self.led = false;
                self.alarm_counter = self.alarm_counter.saturating_add(1);
            }
            // Only start/stop acknowledgments carry meaning.
            Status::Ack => match self.send_char {
                CMD_START => {
                    self.led = true;
                    self.reset_period();
                }
                CMD_STOP => {
                    self.led = false;
                    self.reset_period();
                }
                _ => {}
            },
            Status::Other(_) => {}
        }
        self.received_char = byte;
        status
    }

    /// Closes one aggregation window of `window_ms` milliseconds.
    ///
    /// The period becomes the average interval between the toggles counted in
    /// the window (0 if there were none) and the counter starts over.
    pub fn aggregate(&mut self, window_ms: u32) {
        self.alarm_period = window_ms.checked_div(self.alarm_counter).unwrap_or(0);
        self.alarm_counter = 0;
    }

    /// Toggle counter scaled to full on/off cycles.
    pub fn cycles(&self) -> u32 {
        self.alarm_counter / 2
    }

    fn reset_period(&mut self) {
        self.alarm_period = 0;
        self.alarm_counter = 0;
    }
}

/// Lock-guarded record plus the condition variable that announces changes.
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Mutex<Snapshot>,
    changed: Condvar,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking worker cannot leave the record half-updated in a way that
    // matters: every field is independently valid.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the record under the lock, then signals all waiters
    /// before the lock is released.
    pub fn update<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut guard = self.lock();
        let out = f(&mut guard);
        guard.version = guard.version.wrapping_add(1);
        self.changed.notify_all();
        out
    }

    /// Returns a consistent copy of every field.
    pub fn snapshot(&self) -> Snapshot {
        *self.lock()
    }

    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }

    /// Latches the quit flag and wakes every waiter.
    ///
    /// Returns `true` if this call is the one that flipped the latch.
    pub fn request_quit(&self) -> bool {
        self.update(|s| !std::mem::replace(&mut s.quit, true))
    }

    /// Blocks until the record moves past `seen_version` or quit is latched.
    pub fn wait_for_change(&self, seen_version: u64) -> Snapshot {
        let guard = self
            .changed
            .wait_while(self.lock(), |s| s.version == seen_version && !s.quit)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Blocks for up to `timeout`, returning early once quit is latched.
    ///
    /// Returns the quit flag as seen when the wait ended.
    pub fn wait_for_quit(&self, timeout: Duration) -> bool {
        let (guard, _) = self
            .changed
            .wait_timeout_while(self.lock(), timeout, |s| !s.quit)
            .unwrap_or_else(PoisonError::into_inner);
        guard.quit
    }
}
