//! The four workers sharing one [`SharedState`](crate::state::SharedState).
//!
//! Each worker is a plain blocking loop meant to run on its own thread. They
//! communicate only through the shared record and its quit latch; a worker
//! that hits a local failure latches quit before returning its error.

pub mod aggregator;
pub mod device;
pub mod display;
pub mod keyboard;

pub use keyboard::{KeyInput, KeySource};

/// Identifies a worker in logs and run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    Keyboard,
    DeviceEvents,
    Display,
    Aggregator,
}

impl WorkerKind {
    /// All workers in spawn (and join) order.
    pub const ALL: [WorkerKind; 4] = [
        WorkerKind::Keyboard,
        WorkerKind::DeviceEvents,
        WorkerKind::Display,
        WorkerKind::Aggregator,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            WorkerKind::Keyboard => "Input Keyboard",
            WorkerKind::DeviceEvents => "Input Pipe",
            WorkerKind::Display => "Output",
            WorkerKind::Aggregator => "Alarm",
        }
    }

    /// OS thread name.
    pub fn thread_name(self) -> &'static str {
        match self {
            WorkerKind::Keyboard => "keyboard",
            WorkerKind::DeviceEvents => "device-events",
            WorkerKind::Display => "display",
            WorkerKind::Aggregator => "aggregator",
        }
    }
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
