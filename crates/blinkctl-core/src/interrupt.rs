//! Signal handling.
//!
//! The first SIGINT/SIGTERM latches quit on the shared record so every worker
//! unwinds cooperatively. A second one force-exits with status 130 after
//! running the registered restore hook.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};

use crate::state::SharedState;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static RESTORE_HOOK: OnceLock<Box<dyn Fn() + Send + Sync>> = OnceLock::new();

/// Installs the Ctrl+C handler for `state`.
///
/// # Errors
/// Returns an error if a handler was already installed.
pub fn install(state: Arc<SharedState>) -> Result<()> {
    ctrlc::set_handler(move || {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            // Second interrupt - force exit.
            // Restore terminal first since process::exit() bypasses Drop handlers.
            if let Some(hook) = RESTORE_HOOK.get() {
                hook();
            }
            std::process::exit(130);
        }
        state.request_quit();
    })
    .context("Error setting Ctrl+C handler")
}

/// Checks if an interrupt has been received.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Registers a restore hook called on the second interrupt before exit.
///
/// Typically used to restore terminal state.
pub fn set_restore_hook<F>(hook: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let _ = RESTORE_HOOK.set(Box::new(hook));
}
