//! Aggregator worker: turns the toggle counter into an average period.

use std::time::Duration;

use crate::state::SharedState;

/// Closes one aggregation window every `window` until quit is latched.
///
/// The wait is a bounded condition-variable wait, so the worker keeps its
/// fixed cadence but returns as soon as quit is latched instead of finishing
/// the window.
pub fn run(state: &SharedState, window: Duration) {
    let window_ms = u32::try_from(window.as_millis()).unwrap_or(u32::MAX);
    while !state.wait_for_quit(window) {
        let period = state.update(|s| {
            if !s.quit {
                s.aggregate(window_ms);
            }
            s.alarm_period
        });
        tracing::debug!(period_ms = period, "aggregation window closed");
    }
}
