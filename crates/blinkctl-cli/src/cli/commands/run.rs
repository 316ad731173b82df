//! Default command: run the controller against the configured pipes.

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use blinkctl_core::channel::Channels;
use blinkctl_core::config::Config;
use blinkctl_core::controller::{Controller, Settings};
use blinkctl_core::workers::KeySource;
use blinkctl_core::{interrupt, logging};

use crate::terminal;

#[cfg(unix)]
fn open_channels(config: &Config) -> Result<Channels> {
    Ok(blinkctl_core::channel::fifo::open_pair(
        &config.input_pipe,
        &config.output_pipe,
    )?)
}

#[cfg(not(unix))]
fn open_channels(_config: &Config) -> Result<Channels> {
    anyhow::bail!("named pipes are only supported on unix")
}

pub fn run(config: &Config) -> Result<()> {
    let log_path = config.log_path();
    let _log_guard = logging::init(&log_path)
        .with_context(|| format!("init logging at {}", log_path.display()))?;
    tracing::info!(?config, "starting");

    let channels = open_channels(config)?;

    let controller = Controller::new(Settings::from(config));
    interrupt::install(controller.state())?;

    let interactive = io::stdin().is_terminal();
    let keys: Box<dyn KeySource> = if interactive {
        terminal::install_panic_hook();
        terminal::setup_terminal()?;
        interrupt::set_restore_hook(|| {
            let _ = terminal::restore_terminal();
        });
        Box::new(terminal::CrosstermKeys)
    } else {
        tracing::info!("stdin is not a terminal, reading commands from it as bytes");
        Box::new(terminal::stdin_keys()?)
    };

    let report = controller.run(channels, keys, Box::new(io::stdout()));

    if interactive {
        terminal::restore_terminal()?;
    }
    let mut stdout = io::stdout();
    writeln!(stdout).context("write to stdout")?;

    for (kind, err) in report.failures() {
        eprintln!("{kind}: {err:#}");
    }
    if interrupt::is_interrupted() {
        tracing::info!("stopped by signal");
    }
    tracing::info!(clean = report.is_clean(), "all workers joined");
    Ok(())
}
