//! Core blinkctl library (shared state, device channels, workers, config).

pub mod channel;
pub mod config;
pub mod controller;
pub mod interrupt;
pub mod logging;
pub mod protocol;
pub mod state;
pub mod workers;
