mod cli;
mod terminal;

use blinkctl_core::channel::ChannelOpenError;

/// Exit status when a device pipe cannot be opened.
const EXIT_CHANNEL_OPEN: i32 = 100;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{e:#}"); // pretty anyhow chain
        if e.downcast_ref::<ChannelOpenError>().is_some() {
            std::process::exit(EXIT_CHANNEL_OPEN);
        }
        std::process::exit(1);
    }
}
