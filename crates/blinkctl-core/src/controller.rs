//! Coordinator: spawns the four workers, joins them, reports how each ended.

use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::channel::Channels;
use crate::config::Config;
use crate::state::SharedState;
use crate::workers::{self, KeySource, WorkerKind};

/// Timing knobs shared by the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Bound on every blocking read, and so on how late quit is noticed.
    pub poll_timeout: Duration,
    /// Aggregation window.
    pub window: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(Config::DEFAULT_POLL_TIMEOUT_MS),
            window: Duration::from_secs(Config::DEFAULT_WINDOW_SECS),
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            poll_timeout: config.poll_timeout(),
            window: config.window(),
        }
    }
}

/// How one worker ended.
#[derive(Debug)]
pub struct WorkerOutcome {
    pub kind: WorkerKind,
    pub result: Result<()>,
}

/// Per-worker results of one run, in spawn order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<WorkerOutcome>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (WorkerKind, &anyhow::Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.kind, e)))
    }
}

type WorkerBody = Box<dyn FnOnce(&SharedState) -> Result<()> + Send>;

fn worker_body(f: impl FnOnce(&SharedState) -> Result<()> + Send + 'static) -> WorkerBody {
    Box::new(f)
}

/// Latches quit if the owning worker thread unwinds.
struct QuitOnPanic(Arc<SharedState>);

impl Drop for QuitOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.request_quit();
        }
    }
}

/// Owns the shared state for one controller run.
#[derive(Debug)]
pub struct Controller {
    state: Arc<SharedState>,
    settings: Settings,
}

impl Controller {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: Arc::new(SharedState::new()),
            settings,
        }
    }

    /// Handle to the shared record, e.g. for a signal handler that latches quit.
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Runs all four workers to completion.
    ///
    /// Returns only after every spawned worker has returned. A worker that
    /// fails to spawn or panics is reported as failed and quit is latched so
    /// the others unwind.
    pub fn run(
        &self,
        channels: Channels,
        mut keys: Box<dyn KeySource>,
        mut display: Box<dyn Write + Send>,
    ) -> RunReport {
        let Channels {
            mut source,
            mut sink,
        } = channels;
        let Settings {
            poll_timeout,
            window,
        } = self.settings;

        let bodies: Vec<(WorkerKind, WorkerBody)> = vec![
            (
                WorkerKind::Keyboard,
                worker_body(move |state| {
                    workers::keyboard::run(state, keys.as_mut(), sink.as_mut(), poll_timeout)
                }),
            ),
            (
                WorkerKind::DeviceEvents,
                worker_body(move |state| {
                    workers::device::run(state, source.as_mut(), poll_timeout)
                }),
            ),
            (
                WorkerKind::Display,
                worker_body(move |state| workers::display::run(state, &mut display)),
            ),
            (
                WorkerKind::Aggregator,
                worker_body(move |state| {
                    workers::aggregator::run(state, window);
                    Ok(())
                }),
            ),
        ];

        let mut handles: Vec<(WorkerKind, Option<JoinHandle<Result<()>>>)> = Vec::new();
        for (kind, body) in bodies {
            let state = Arc::clone(&self.state);
            let spawned = thread::Builder::new()
                .name(kind.thread_name().to_string())
                .spawn(move || {
                    let _guard = QuitOnPanic(Arc::clone(&state));
                    body(&state)
                });
            match spawned {
                Ok(handle) => {
                    tracing::info!(worker = %kind, "create thread OK");
                    handles.push((kind, Some(handle)));
                }
                Err(err) => {
                    tracing::error!(worker = %kind, error = %err, "create thread FAIL");
                    self.state.request_quit();
                    handles.push((kind, None));
                }
            }
        }

        let mut report = RunReport::default();
        for (kind, handle) in handles {
            tracing::debug!(worker = %kind, "joining thread");
            let result = match handle {
                None => Err(anyhow!("{kind} thread was never started")),
                Some(handle) => match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!("{kind} thread panicked")),
                },
            };
            match &result {
                Ok(()) => tracing::info!(worker = %kind, "join thread OK"),
                Err(err) => {
                    let message = format!("{err:#}");
                    tracing::warn!(worker = %kind, error = %message, "thread ended with error");
                }
            }
            report.outcomes.push(WorkerOutcome { kind, result });
        }
        report
    }
}
